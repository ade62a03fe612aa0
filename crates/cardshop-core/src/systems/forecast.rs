//! Reorder suggestions from recent sales and current stock.

use cardshop_logic::forecast::{
    average_daily_units, rank_suggestions, recommended_qty, RestockSuggestion,
};
use cardshop_logic::products::ProductKind;

use crate::world::ShopWorld;

/// Products worth reordering, most urgent first, at most `max` entries.
pub fn restock_suggestions(
    world: &ShopWorld,
    lead_time_s: f64,
    window_days: u32,
    max: usize,
) -> Vec<RestockSuggestion> {
    let day = world.clock.day_index;
    let lead = lead_time_s.max(1.0);
    let mut suggestions: Vec<RestockSuggestion> = ProductKind::all()
        .into_iter()
        .filter_map(|product| {
            let sold = world.analytics.units_sold_window(day, window_days, product);
            let avg = average_daily_units(sold);
            let current = world.total_stock(product);
            let qty = recommended_qty(avg, world.config.day_duration_s, lead, current);
            (qty > 0).then_some(RestockSuggestion {
                product,
                recommended_qty: qty,
                avg_daily_units: avg,
                current_total_stock: current,
                lead_time_s: lead,
            })
        })
        .collect();
    rank_suggestions(&mut suggestions);
    suggestions.truncate(max.max(1));
    suggestions
}
