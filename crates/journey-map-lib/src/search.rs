//! Debounced location search
//!
//! `SearchCoordinator` owns the query string and decides when a lookup may
//! be issued. The transport lives elsewhere; this module only hands out
//! [`LookupRequest`]s and consumes their outcomes.
//!
//! Results are applied in query-order, not arrival-order: an outcome is
//! compared against the *live* query at resolution time and discarded when
//! it no longer matches. Lookup failures are logged and become an empty
//! result list, never an error for the caller.

use crate::MapError;
use crate::coords::Coordinate;
use crate::debounce::Debouncer;
use instant::Instant;
use std::time::Duration;

/// Queries shorter than this never trigger a lookup.
pub const MIN_QUERY_LEN: usize = 3;

/// How long the query must be stable before a lookup is issued.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Result lists are capped at this many entries.
pub const MAX_RESULTS: usize = 10;

/// A single geocoding hit.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub name: String,
    pub coordinate: Coordinate,
    pub country: Option<String>,
    pub admin_area: Option<String>,
    pub population: Option<u64>,
}

/// A lookup the transport layer should now perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupRequest {
    pub query: String,
}

/// Owns the query string, debounces it, and applies results in query-order.
pub struct SearchCoordinator {
    query: String,
    results: Vec<SearchResult>,
    debounce: Debouncer,
    /// Query text of the lookup currently in flight, if any.
    in_flight: Option<String>,
    /// Whether the last completed lookup produced an empty list.
    last_lookup_empty: bool,
}

impl SearchCoordinator {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            debounce: Debouncer::new(SEARCH_DEBOUNCE),
            in_flight: None,
            last_lookup_empty: false,
        }
    }

    /// Update the query. Unchanged text is a no-op; short queries clear the
    /// results immediately; anything else (re)starts the debounce window.
    pub fn set_query(&mut self, text: &str, now: Instant) {
        if text == self.query {
            return;
        }
        self.query = text.to_string();
        self.last_lookup_empty = false;

        if self.query.len() < MIN_QUERY_LEN {
            self.results.clear();
            self.debounce.cancel();
        } else {
            self.debounce.schedule(now);
        }
    }

    /// Issue at most one lookup: only once the debounce window has elapsed
    /// and no other lookup is in flight. While one is in flight the deadline
    /// is held, not dropped, so the newest query still gets its lookup.
    pub fn poll(&mut self, now: Instant) -> Option<LookupRequest> {
        if self.in_flight.is_some() {
            return None;
        }
        if self.debounce.fire(now) {
            self.in_flight = Some(self.query.clone());
            return Some(LookupRequest {
                query: self.query.clone(),
            });
        }
        None
    }

    /// Apply a lookup outcome. Stale outcomes (the query has moved on) are
    /// discarded; failures clear the results and are only logged.
    pub fn apply_response(
        &mut self,
        query: &str,
        outcome: Result<Vec<SearchResult>, MapError>,
    ) {
        if self.in_flight.as_deref() == Some(query) {
            self.in_flight = None;
        }

        if query != self.query {
            tracing::debug!(stale = query, live = %self.query, "discarding stale search result");
            return;
        }

        match outcome {
            Ok(results) => {
                self.results = results
                    .into_iter()
                    .filter(|r| !r.name.is_empty() && r.coordinate.is_valid())
                    .take(MAX_RESULTS)
                    .collect();
                self.last_lookup_empty = self.results.is_empty();
            }
            Err(err) => {
                tracing::warn!(query, error = %err, "search lookup failed");
                self.results.clear();
                self.last_lookup_empty = false;
            }
        }
    }

    /// Strictly "a lookup is in flight".
    pub fn is_searching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    /// True when the last completed lookup for the live query found nothing.
    pub fn found_nothing(&self) -> bool {
        self.last_lookup_empty
    }

    /// Clear the query and results (e.g., after a result is selected).
    pub fn reset(&mut self) {
        self.query.clear();
        self.results.clear();
        self.debounce.cancel();
        self.last_lookup_empty = false;
    }

    /// The pending debounce deadline, for render-loop wakeup scheduling.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }
}

impl Default for SearchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, lat: f64, lon: f64) -> SearchResult {
        SearchResult {
            name: name.to_string(),
            coordinate: Coordinate::new(lat, lon),
            country: None,
            admin_area: None,
            population: None,
        }
    }

    #[test]
    fn test_short_queries_never_issue_lookups() {
        let mut search = SearchCoordinator::new();
        let t0 = Instant::now();

        search.apply_response("xx", Ok(vec![result("Stale", 1.0, 1.0)]));
        search.set_query("Pa", t0);
        assert!(search.poll(t0 + SEARCH_DEBOUNCE * 2).is_none());
        assert!(search.results().is_empty());
        assert!(!search.is_searching());
    }

    #[test]
    fn test_short_query_clears_existing_results() {
        let mut search = SearchCoordinator::new();
        let t0 = Instant::now();

        search.set_query("Paris", t0);
        let request = search.poll(t0 + SEARCH_DEBOUNCE).unwrap();
        search.apply_response(&request.query, Ok(vec![result("Paris", 48.85, 2.35)]));
        assert_eq!(search.results().len(), 1);

        search.set_query("Pa", t0 + SEARCH_DEBOUNCE * 2);
        assert!(search.results().is_empty());
    }

    #[test]
    fn test_rapid_changes_issue_one_lookup_for_final_query() {
        let mut search = SearchCoordinator::new();
        let t0 = Instant::now();
        let step = Duration::from_millis(100);

        search.set_query("Par", t0);
        assert!(search.poll(t0 + step).is_none());
        search.set_query("Pari", t0 + step);
        search.set_query("Paris", t0 + step * 2);

        // Nothing until 500ms after the last change
        assert!(search.poll(t0 + step * 6).is_none());

        let request = search.poll(t0 + step * 7).unwrap();
        assert_eq!(request.query, "Paris");

        // And nothing further
        assert!(search.poll(t0 + step * 20).is_none());
    }

    #[test]
    fn test_paris_scenario() {
        let mut search = SearchCoordinator::new();
        let t0 = Instant::now();

        search.set_query("Par", t0);
        let request = search.poll(t0 + SEARCH_DEBOUNCE).unwrap();
        assert_eq!(request.query, "Par");
        assert!(search.is_searching());

        let mut paris = result("Paris", 48.8566, 2.3522);
        paris.country = Some("France".to_string());
        search.apply_response("Par", Ok(vec![paris.clone()]));

        assert_eq!(search.results(), &[paris]);
        assert!(!search.is_searching());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut search = SearchCoordinator::new();
        let t0 = Instant::now();

        search.set_query("Par", t0);
        let first = search.poll(t0 + SEARCH_DEBOUNCE).unwrap();

        // The query moves on before the first lookup resolves
        search.set_query("Berlin", t0 + SEARCH_DEBOUNCE);

        search.apply_response(&first.query, Ok(vec![result("Paris", 48.85, 2.35)]));
        assert!(search.results().is_empty());
        assert!(!search.is_searching());

        // The newer query still gets its lookup
        let second = search.poll(t0 + SEARCH_DEBOUNCE * 2).unwrap();
        assert_eq!(second.query, "Berlin");
    }

    #[test]
    fn test_deadline_held_while_lookup_in_flight() {
        let mut search = SearchCoordinator::new();
        let t0 = Instant::now();

        search.set_query("Par", t0);
        search.poll(t0 + SEARCH_DEBOUNCE).unwrap();

        // A newer query debounces while the first lookup is still in flight
        search.set_query("Paris", t0 + SEARCH_DEBOUNCE);
        assert!(search.poll(t0 + SEARCH_DEBOUNCE * 2).is_none());

        // Once the first resolves (stale), the held deadline issues the next
        search.apply_response("Par", Ok(vec![result("Paris", 48.85, 2.35)]));
        let request = search.poll(t0 + SEARCH_DEBOUNCE * 2).unwrap();
        assert_eq!(request.query, "Paris");
    }

    #[test]
    fn test_failure_clears_results() {
        let mut search = SearchCoordinator::new();
        let t0 = Instant::now();

        search.set_query("Paris", t0);
        let request = search.poll(t0 + SEARCH_DEBOUNCE).unwrap();
        search.apply_response(&request.query, Ok(vec![result("Paris", 48.85, 2.35)]));
        assert_eq!(search.results().len(), 1);

        search.set_query("Berlin", t0 + SEARCH_DEBOUNCE);
        let request = search.poll(t0 + SEARCH_DEBOUNCE * 2).unwrap();
        search.apply_response(
            &request.query,
            Err(MapError::Geocoding("connection refused".to_string())),
        );
        assert!(search.results().is_empty());
        assert!(!search.is_searching());
    }

    #[test]
    fn test_results_filtered_and_capped() {
        let mut search = SearchCoordinator::new();
        let t0 = Instant::now();

        search.set_query("Spr", t0);
        let request = search.poll(t0 + SEARCH_DEBOUNCE).unwrap();

        let mut results: Vec<_> = (0..15)
            .map(|i| result(&format!("Springfield {i}"), 40.0 + i as f64 * 0.1, -89.0))
            .collect();
        results.push(result("", 1.0, 1.0)); // no name
        results.push(result("Nowhere", f64::NAN, 1.0)); // invalid coordinate

        search.apply_response(&request.query, Ok(results));
        assert_eq!(search.results().len(), MAX_RESULTS);
        assert!(search.results().iter().all(|r| !r.name.is_empty()));
    }
}
