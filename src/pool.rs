//! Ordered pool of validation server endpoints.

/// An ordered list of endpoint fragments consumed through a cursor.
///
/// Endpoints are scheme-less (`host/path`); the dispatcher prefixes the
/// configured scheme. Reset the cursor before each validation call so
/// repeated calls consume the full list again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerPool {
    endpoints: Vec<String>,
    cursor: usize,
}

impl ServerPool {
    pub fn new(endpoints: Vec<String>) -> Self {
        ServerPool {
            endpoints,
            cursor: 0,
        }
    }

    /// Append another endpoint to the pool.
    pub fn add(&mut self, endpoint: impl Into<String>) {
        self.endpoints.push(endpoint.into());
    }

    /// The endpoint at the cursor, advancing it; `None` once exhausted.
    pub fn next_endpoint(&mut self) -> Option<&str> {
        let endpoint = self.endpoints.get(self.cursor)?;
        self.cursor += 1;
        Some(endpoint)
    }

    /// Rewind the cursor to the start of the list.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_endpoints_in_order_then_exhausts() {
        let mut pool = ServerPool::new(vec!["a".into(), "b".into()]);
        assert_eq!(pool.next_endpoint(), Some("a"));
        assert_eq!(pool.next_endpoint(), Some("b"));
        assert_eq!(pool.next_endpoint(), None);
        assert_eq!(pool.next_endpoint(), None);
    }

    #[test]
    fn reset_rewinds_the_cursor() {
        let mut pool = ServerPool::new(vec!["a".into()]);
        assert_eq!(pool.next_endpoint(), Some("a"));
        assert_eq!(pool.next_endpoint(), None);
        pool.reset();
        assert_eq!(pool.next_endpoint(), Some("a"));
    }

    #[test]
    fn add_appends_to_the_list() {
        let mut pool = ServerPool::new(Vec::new());
        assert!(pool.is_empty());
        pool.add("api.example.com/verify");
        pool.add("api2.example.com/verify".to_string());
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.next_endpoint(), Some("api.example.com/verify"));
        assert_eq!(pool.next_endpoint(), Some("api2.example.com/verify"));
    }
}
