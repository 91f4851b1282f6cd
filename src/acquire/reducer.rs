/// Yields truncated URL prefixes, most specific first, by repeatedly
/// cutting the last path segment. Stops before the bare `scheme://host`
/// is reached: kits live at or above the phishing page's path, but a
/// probe against the naked domain is never worth the request.
pub struct PrefixIter {
    current: String,
}

impl PrefixIter {
    pub fn new(url: &str) -> Self {
        Self {
            current: url.trim().to_string(),
        }
    }
}

impl Iterator for PrefixIter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        // `scheme://host/seg` holds exactly 3 slashes; only deeper
        // strings still have a segment worth cutting.
        if self.current.bytes().filter(|b| *b == b'/').count() <= 3 {
            return None;
        }
        let pos = self.current.rfind('/')?;
        self.current.truncate(pos);
        Some(self.current.clone())
    }
}
