use serde::Serialize;

/// Page number and size parsed from raw query strings.
///
/// Malformed or out-of-range input is not an error: it marks the request as
/// out of bounds, which callers answer with an empty page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
    pub in_bounds: bool,
}

impl PageRequest {
    pub fn parse(
        page: Option<&str>,
        per_page: Option<&str>,
        default_per_page: usize,
        max_per_page: usize,
    ) -> Self {
        let mut in_bounds = true;

        let page = match non_empty(page) {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(p) if p >= 1 => p,
                Ok(p) => {
                    in_bounds = false;
                    p
                }
                Err(_) => {
                    in_bounds = false;
                    1
                }
            },
        };

        let per_page = match non_empty(per_page) {
            None => default_per_page as i64,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 1 && n <= max_per_page as i64 => n,
                _ => {
                    in_bounds = false;
                    default_per_page as i64
                }
            },
        };

        Self {
            page,
            per_page,
            in_bounds,
        }
    }

    pub fn first(per_page: usize) -> Self {
        Self {
            page: 1,
            per_page: per_page as i64,
            in_bounds: true,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page.max(1))
    }

    pub fn limit(&self) -> i64 {
        self.per_page.max(1)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// One page of results plus the numbers needed to render pagination links.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub per_page: i64,
    pub current_page: i64,
    pub last_page: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, request: PageRequest) -> Self {
        let per_page = request.per_page.max(1);
        let last_page = if total > 0 { (total - 1) / per_page + 1 } else { 1 };
        Self {
            data,
            total,
            per_page: request.per_page,
            current_page: request.page,
            last_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
            last_page: self.last_page,
        }
    }
}
