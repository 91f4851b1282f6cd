/// Deterministic identity of a URL prefix, used to dedup downloads:
/// every extension probed against the same prefix maps to the same
/// fingerprint, so one archive per underlying kit is kept.
pub fn fingerprint(prefix: &str) -> String {
    format!("{:x}", md5::compute(prefix.as_bytes()))
}

/// Destination file name for a downloaded kit: the last path segment of
/// the prefix, a short fingerprint suffix against collisions between
/// kits that share a segment name, and the original extension.
pub fn kit_file_name(prefix: &str, fp: &str, ext: &str) -> String {
    let segment = prefix
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(prefix);
    format!("{}#{}{}", segment, &fp[..5], ext)
}
