/// Renders a byte count with a base-1000 unit suffix, e.g. `999 B`, `1.5 kB`, `12.3 MB`.
///
/// Values below 1000 are printed as whole bytes; everything above uses one
/// decimal place. Used for download progress shown to people (the raw
/// `downloading` event payload stays a plain integer).
///
/// # Arguments
/// * `size` - The byte count to format.
///
/// # Returns
/// A `String` such as `"48.2 MB"`.
pub fn human_readable_size(size: u64) -> String {
    const UNIT: u64 = 1000;
    const PREFIXES: [char; 6] = ['k', 'M', 'G', 'T', 'P', 'E'];

    if size < UNIT {
        return format!("{size} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = size / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}B", size as f64 / div as f64, PREFIXES[exp])
}
