//! Text formatting shared by the card and detail views: money, elapsed time
//! and truncation.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Currencies the dashboard can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Currency {
    #[default]
    Brl,
    Usd,
}

impl Currency {
    fn symbol(self) -> &'static str {
        match self {
            Currency::Brl => "R$ ",
            Currency::Usd => "$",
        }
    }

    /// (thousands, decimal) separators.
    fn separators(self) -> (char, char) {
        match self {
            Currency::Brl => ('.', ','),
            Currency::Usd => (',', '.'),
        }
    }
}

/// Formats `amount` with two decimals, half away from zero.
///
/// `R$ 27,50`, `R$ 1.234,50`, `-R$ 3,00`, `$1,234.50`.
pub fn format_currency(amount: Decimal, currency: Currency) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    let (thousands, decimal) = currency.separators();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(thousands);
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{}{grouped}{decimal}{cents}", currency.symbol())
}

/// Brazilian Real, the dashboard's currency.
pub fn format_brl(amount: Decimal) -> String {
    format_currency(amount, Currency::Brl)
}

const MINUTES_IN_DAY: i64 = 1_440;
const MINUTES_IN_ALMOST_TWO_DAYS: i64 = 2_520;
const MINUTES_IN_MONTH: i64 = 43_200;
const MINUTES_IN_TWO_MONTHS: i64 = 86_400;

/// Relative time in Portuguese with a suffix: `há 5 minutos`, `em 2 dias`.
///
/// Follows the buckets of date-fns `formatDistanceToNow` (pt-BR, `addSuffix`).
/// A missing timestamp counts as `now`.
pub fn relative_time(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let at = at.unwrap_or(now);
    let future = at > now;
    let seconds = (now - at).num_seconds().abs();
    let minutes = (seconds as f64 / 60.0).round() as i64;

    let distance = if minutes < 2 {
        if minutes == 0 {
            "menos de um minuto".to_string()
        } else {
            "1 minuto".to_string()
        }
    } else if minutes < 45 {
        format!("{minutes} minutos")
    } else if minutes < 90 {
        "cerca de 1 hora".to_string()
    } else if minutes < MINUTES_IN_DAY {
        let hours = (minutes as f64 / 60.0).round() as i64;
        format!("cerca de {hours} horas")
    } else if minutes < MINUTES_IN_ALMOST_TWO_DAYS {
        "1 dia".to_string()
    } else if minutes < MINUTES_IN_MONTH {
        let days = (minutes as f64 / MINUTES_IN_DAY as f64).round() as i64;
        format!("{days} dias")
    } else if minutes < MINUTES_IN_TWO_MONTHS {
        let months = (minutes as f64 / MINUTES_IN_MONTH as f64).round() as i64;
        plural(months, "cerca de 1 mês", "cerca de {} meses")
    } else {
        let months = minutes / MINUTES_IN_MONTH;
        if months < 12 {
            let nearest = (minutes as f64 / MINUTES_IN_MONTH as f64).round() as i64;
            plural(nearest, "1 mês", "{} meses")
        } else {
            let years = months / 12;
            match months % 12 {
                0..=2 => plural(years, "cerca de 1 ano", "cerca de {} anos"),
                3..=8 => plural(years, "mais de 1 ano", "mais de {} anos"),
                _ => plural(years + 1, "quase 1 ano", "quase {} anos"),
            }
        }
    };

    if future {
        format!("em {distance}")
    } else {
        format!("há {distance}")
    }
}

fn plural(count: i64, one: &str, other: &str) -> String {
    if count == 1 {
        one.to_string()
    } else {
        other.replace("{}", &count.to_string())
    }
}

/// Cuts `text` to at most `max` characters, ending in `…` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_brl() {
        assert_eq!(format_brl(dec!(27.5)), "R$ 27,50");
        assert_eq!(format_brl(dec!(1234.5)), "R$ 1.234,50");
        assert_eq!(format_brl(dec!(1234567)), "R$ 1.234.567,00");
        assert_eq!(format_brl(dec!(0)), "R$ 0,00");
        assert_eq!(format_brl(dec!(-3)), "-R$ 3,00");
        assert_eq!(format_brl(dec!(0.005)), "R$ 0,01");
        assert_eq!(format_brl(dec!(-0.001)), "R$ 0,00");
    }

    #[test]
    fn test_usd() {
        assert_eq!(format_currency(dec!(1234.5), Currency::Usd), "$1,234.50");
        assert_eq!(format_currency(dec!(999.999), Currency::Usd), "$1,000.00");
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc::now();
        let ago = |d: Duration| relative_time(Some(now - d), now);

        assert_eq!(ago(Duration::seconds(10)), "há menos de um minuto");
        assert_eq!(ago(Duration::seconds(75)), "há 1 minuto");
        assert_eq!(ago(Duration::minutes(5)), "há 5 minutos");
        assert_eq!(ago(Duration::minutes(50)), "há cerca de 1 hora");
        assert_eq!(ago(Duration::hours(3)), "há cerca de 3 horas");
        assert_eq!(ago(Duration::hours(30)), "há 1 dia");
        assert_eq!(ago(Duration::days(5)), "há 5 dias");
        assert_eq!(ago(Duration::days(45)), "há cerca de 2 meses");
        assert_eq!(ago(Duration::days(200)), "há 7 meses");
        assert_eq!(ago(Duration::days(365)), "há cerca de 1 ano");
        assert_eq!(ago(Duration::days(900)), "há mais de 2 anos");
    }

    #[test]
    fn test_missing_or_future_timestamps() {
        let now = Utc::now();
        assert_eq!(relative_time(None, now), "há menos de um minuto");
        assert_eq!(
            relative_time(Some(now + Duration::minutes(10)), now),
            "em 10 minutos"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Rua A, 1", 32), "Rua A, 1");
        let long = "Avenida Engenheiro Luís Carlos Berrini, 1500";
        let cut = truncate(long, 32);
        assert!(cut.ends_with('…'));
        assert!(cut.chars().count() <= 32);
        assert!(cut.starts_with("Avenida Engenheiro Luís Carlos"));
    }
}
