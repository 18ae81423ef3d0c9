/// Substrings that mark a row as a table header rather than a departure.
pub const HEADER_TOKENS: [&str; 6] = ["Route", "Line", "To", "Destination", "Scheduled", "Expected"];

const MAX_ROUTE_LEN: usize = 10;
const MAX_DESTINATION_LEN: usize = 20;
const MAX_TIME_LEN: usize = 10;

/// Decide whether a row's first three (trimmed) cells are a header or noise.
///
/// A row is rejected when any cell contains a header token (case-sensitive),
/// or when any cell is longer than its column allows. The length limits apply
/// on their own, so a destination over 20 characters is rejected even when no
/// token matches.
pub fn is_header_or_noise(route: &str, destination: &str, time: &str) -> bool {
    let has_token = HEADER_TOKENS
        .iter()
        .any(|token| route.contains(token) || destination.contains(token) || time.contains(token));

    has_token
        || route.chars().count() > MAX_ROUTE_LEN
        || destination.chars().count() > MAX_DESTINATION_LEN
        || time.chars().count() > MAX_TIME_LEN
}
