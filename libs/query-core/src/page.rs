/// Largest offset or limit a store accepts (SQL engines bind them as `i64`).
pub const MAX_SQL_OFFSET: u64 = i64::MAX as u64;

/// Page size bounds for offset pagination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimitCfg {
    pub default: u64,
    pub max: u64,
}

impl Default for LimitCfg {
    fn default() -> Self {
        Self {
            default: 100,
            max: 1000,
        }
    }
}

/// Resolved `page`/`limit` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Apply defaults and clamp the limit into `1..=cfg.max`.
    pub fn resolve(page: Option<u64>, limit: Option<u64>, cfg: LimitCfg) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let mut limit = limit.filter(|l| *l > 0).unwrap_or(cfg.default);
        if limit == 0 {
            limit = 1;
        }
        if limit > cfg.max {
            limit = cfg.max;
        }
        Self {
            page,
            limit: limit.min(MAX_SQL_OFFSET),
        }
    }

    /// `(page-1)*limit`, saturated at [`MAX_SQL_OFFSET`]; such a page is
    /// simply past the end.
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.limit)
            .min(MAX_SQL_OFFSET)
    }
}
