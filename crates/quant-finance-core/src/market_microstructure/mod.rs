pub mod trade_cost;
