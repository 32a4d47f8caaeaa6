mod daily_totals;
mod sessions;
