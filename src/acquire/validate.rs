/// Statuses worth inspecting at all; redirects are deliberately absent
/// so a `301` to a parking page is never mistaken for a kit.
const ACCEPTABLE_STATUS: &[u16] = &[100, 101, 200, 201, 202, 203, 204, 205, 206];

/// Decide whether a response body should be treated as a downloadable
/// archive rather than an HTML error page.
///
/// Heuristic, not a format parser: archives are binary, so anything that
/// decodes cleanly as UTF-8 is rejected as a page. Some servers ship
/// HTML in a non-UTF-8 encoding, so binary payloads are additionally
/// screened for HTML document markers. Low rates of false positives
/// (binary garbage accepted) and false negatives are expected.
pub fn is_archive_payload(status: u16, body: &[u8]) -> bool {
    if !ACCEPTABLE_STATUS.contains(&status) {
        return false;
    }
    if std::str::from_utf8(body).is_ok() {
        return false;
    }
    let lowered = String::from_utf8_lossy(body).to_lowercase();
    !(lowered.contains("<!doctype html>") || lowered.contains("</html>"))
}
