use crate::{
    error::{ComtradeError, Result},
    period::PeriodToken,
};

/// Most periods the Comtrade data endpoint accepts in one request.
pub const PERIODS_PER_REQUEST: usize = 12;

/// Split period tokens into contiguous batches of at most `limit` tokens.
///
/// Batches keep the input order and cover every token exactly once; an
/// empty input gives no batches.
pub fn split_chunks(tokens: &[PeriodToken], limit: usize) -> Result<Vec<Vec<PeriodToken>>> {
    if limit == 0 {
        return Err(ComtradeError::InvalidQuery(
            "chunk size must be at least 1".to_string(),
        ));
    }
    Ok(tokens.chunks(limit).map(<[PeriodToken]>::to_vec).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodSelection;
    use tde_utils::periods::YearMonth;

    fn months(count: i64) -> Vec<PeriodToken> {
        let start = YearMonth::new(2020, 1).unwrap();
        let end = YearMonth::from_ordinal(start.ordinal() + count - 1);
        PeriodSelection::Monthly { start, end }.expand()
    }

    #[test]
    fn test_split_25_by_12() {
        let tokens = months(25);
        assert_eq!(tokens.len(), 25);
        let chunks = split_chunks(&tokens, PERIODS_PER_REQUEST).unwrap();
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, [12, 12, 1]);
        let rejoined: Vec<PeriodToken> = chunks.into_iter().flatten().collect();
        assert_eq!(rejoined, tokens);
    }

    #[test]
    fn test_exact_multiple() {
        let chunks = split_chunks(&months(24), 12).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 12));
    }

    #[test]
    fn test_empty_input() {
        assert!(split_chunks(&[], 12).unwrap().is_empty());
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(split_chunks(&months(3), 0).is_err());
    }
}
