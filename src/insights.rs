use anyhow::{Result, bail};

use crate::data::aggregate::DashboardReport;
use crate::data::model::weekday_name;

// ---------------------------------------------------------------------------
// Insight providers: aggregation tables in, commentary out
// ---------------------------------------------------------------------------

/// Produces free-text commentary for a report. Providers are optional;
/// nothing in the filter or aggregation path depends on them.
pub trait InsightProvider {
    fn name(&self) -> &str;
    fn generate(&self, report: &DashboardReport) -> Result<String>;
}

/// Run `provider`, turning any failure into `None`.
pub fn describe_report(provider: &dyn InsightProvider, report: &DashboardReport) -> Option<String> {
    match provider.generate(report) {
        Ok(text) => Some(text),
        Err(e) => {
            log::warn!("insight provider `{}` failed: {e:#}", provider.name());
            None
        }
    }
}

/// Local, rule-based commentary over the report tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicInsights;

impl InsightProvider for HeuristicInsights {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn generate(&self, report: &DashboardReport) -> Result<String> {
        if report.is_empty() {
            bail!("no bookings to describe");
        }

        let mut lines = Vec::new();

        if let Some(top) = report.routes.first() {
            let share = top.bookings as f64 / report.headline.total_bookings as f64 * 100.0;
            lines.push(format!(
                "{} is the busiest route with {} bookings ({share:.0}% of the selection), averaging ${:.2}.",
                top.route, top.bookings, top.mean_price
            ));
        }

        if let Some(busiest) = report.weekday_demand.iter().max_by_key(|d| d.bookings) {
            lines.push(format!(
                "Most bookings are made on {} ({}).",
                weekday_name(busiest.weekday),
                busiest.bookings
            ));
        }

        let cheapest = report
            .weekday_demand
            .iter()
            .filter_map(|d| d.mean_price.map(|p| (d.weekday, p)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((day, price)) = cheapest {
            lines.push(format!(
                "Bookings made on {} are cheapest on average (${price:.2}).",
                weekday_name(day)
            ));
        }

        let low = report.price_trend.iter().map(|p| p.min_price).reduce(f64::min);
        let high = report.price_trend.iter().map(|p| p.max_price).reduce(f64::max);
        if let (Some(low), Some(high), Some(first), Some(last)) = (
            low,
            high,
            report.price_trend.first(),
            report.price_trend.last(),
        ) {
            lines.push(format!(
                "Fares range from ${low:.2} to ${high:.2} for departures between {} and {}.",
                first.period_start, last.period_start
            ));
        }

        if let Some(lead) = report.headline.average_lead_time_days {
            lines.push(format!("Travellers book {lead:.1} days ahead on average."));
        }

        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::TrendGranularity;
    use crate::data::filter::{FilterCriteria, filter};
    use crate::data::model::fixtures::syd_mel;

    struct Unavailable;

    impl InsightProvider for Unavailable {
        fn name(&self) -> &str {
            "unavailable"
        }

        fn generate(&self, _report: &DashboardReport) -> Result<String> {
            bail!("service unreachable")
        }
    }

    fn report() -> DashboardReport {
        let ds = syd_mel();
        let view = filter(&ds, &FilterCriteria::default());
        DashboardReport::compute(&view, TrendGranularity::Day)
    }

    #[test]
    fn heuristic_mentions_top_route() {
        let text = describe_report(&HeuristicInsights, &report()).expect("insights");
        assert!(text.contains("SYD → MEL is the busiest route with 2 bookings"));
        assert!(text.contains("3.0 days ahead"));
    }

    #[test]
    fn failing_provider_leaves_report_untouched() {
        let report = report();
        let before = report.clone();
        assert!(describe_report(&Unavailable, &report).is_none());
        assert_eq!(report, before);
    }

    #[test]
    fn empty_report_yields_no_insights() {
        let ds = syd_mel();
        let view = filter(
            &ds,
            &FilterCriteria {
                origin: Some("Nowhere".to_string()),
                ..Default::default()
            },
        );
        let empty = DashboardReport::compute(&view, TrendGranularity::Day);
        assert!(describe_report(&HeuristicInsights, &empty).is_none());
    }
}
