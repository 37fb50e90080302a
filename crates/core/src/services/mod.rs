pub mod portfolio_service;
pub mod rate_service;
pub mod trade_service;
pub mod update_service;
pub mod user_service;
