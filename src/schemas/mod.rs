// Defines the data structures (schemas) shared across the driver pipeline:
// configuration file layout, resolved settings, versions and progress events.

// Configuration file schema, resolved settings and the driver version type.
pub mod driver;
// Progress events streamed to sinks while an install runs.
pub mod progress;
