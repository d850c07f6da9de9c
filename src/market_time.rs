use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

/// Trading calendar and every schedule run on Indian Standard Time.
pub const MARKET_TZ: Tz = chrono_tz::Asia::Kolkata;

/// Current calendar date in the market timezone.
pub fn market_today() -> NaiveDate {
    Utc::now().with_timezone(&MARKET_TZ).date_naive()
}
