/// Shared application state available to all route handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// The async weekpulse client. Dispatches blocking fetches and
    /// aggregation to a thread pool and rejects overlapping refreshes.
    pub pulse: weekpulse::AsyncWeekpulse,
}
