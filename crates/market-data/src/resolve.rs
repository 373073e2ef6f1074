use crate::DataSource;
use crate::error::DataError;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Resolves the effective trade date for a request.
///
/// An explicit date is taken at face value, even if no instrument has data on
/// it; the universe resolution that follows will surface that as an empty
/// universe. With no date requested, the most recent date present in the data
/// source is used, and an entirely empty source is an error.
pub async fn resolve_trade_date(
    source: &dyn DataSource,
    requested: Option<NaiveDate>,
) -> Result<NaiveDate, DataError> {
    match requested {
        Some(date) => Ok(date),
        None => source.latest_date().await?.ok_or(DataError::NoData),
    }
}

/// Resolves the instrument universe for a trade date.
///
/// With no explicit ticker list, the universe is every instrument with data
/// on the date. An explicit list is intersected with availability, so asking
/// for unknown tickers cannot smuggle empty series into the evaluation. An
/// empty outcome either way is `EmptyUniverse`, the one resolution failure
/// that is the caller's fault rather than the server's.
pub async fn resolve_universe(
    source: &dyn DataSource,
    requested: Option<&[String]>,
    date: NaiveDate,
) -> Result<Vec<String>, DataError> {
    let available = source.tickers_on(date).await?;

    let resolved: Vec<String> = match requested {
        Some(list) => {
            let wanted: HashSet<&str> = list.iter().map(String::as_str).collect();
            available
                .into_iter()
                .filter(|ticker| wanted.contains(ticker.as_str()))
                .collect()
        }
        None => available,
    };

    if resolved.is_empty() {
        return Err(DataError::EmptyUniverse(date));
    }
    Ok(resolved)
}
