use serde::Serialize;

pub const STATUS_OK: &str = "OK";

/// Success envelope: `{"status":"OK", ["count"|"length": n,] "data": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: STATUS_OK,
            count: None,
            length: None,
            data,
        }
    }

    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n);
        self
    }

    pub fn with_length(mut self, n: usize) -> Self {
        self.length = Some(n);
        self
    }
}
