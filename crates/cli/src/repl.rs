//! Interactive prompt: session state, line parsing, command dispatch.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use currex_core::errors::CoreError;
use currex_core::models::user::User;
use currex_core::services::trade_service::{TradeReceipt, TradeSide};
use currex_core::TradeHub;

const HELP: &str = "Available commands: register, login, show-portfolio, buy, sell, \
                    get-rate, update-rates, show-rates, help, exit";

/// Run the interactive loop until `exit` or end of input.
pub async fn run(hub: &TradeHub) -> Result<(), CoreError> {
    println!("Currex CLI — type a command (help for the list).");

    let stdin = io::stdin();
    let mut session: Option<User> = None;

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            continue;
        };

        match command {
            "exit" | "quit" => break,
            "help" => println!("{HELP}"),
            "register" => register(hub, args),
            "login" => login(hub, args, &mut session),
            "show-portfolio" => show_portfolio(hub, args, session.as_ref()).await,
            "buy" => trade(hub, args, session.as_ref(), TradeSide::Buy).await,
            "sell" => trade(hub, args, session.as_ref(), TradeSide::Sell).await,
            "get-rate" => get_rate(hub, args).await,
            "update-rates" => update_rates(hub).await,
            "show-rates" => show_rates(hub),
            _ => println!("Unknown command: {command}. Type 'help' for the list."),
        }
    }

    println!("Bye.");
    Ok(())
}

/// Collect `--flag value` pairs into a map.
fn parse_flags(args: &[&str]) -> Result<HashMap<String, String>, String> {
    if args.len() % 2 != 0 {
        return Err("Arguments must come in '--flag value' pairs.".into());
    }
    let mut flags = HashMap::new();
    for pair in args.chunks(2) {
        let Some(name) = pair[0].strip_prefix("--") else {
            return Err(format!("Expected a '--flag', got '{}'.", pair[0]));
        };
        flags.insert(name.to_string(), pair[1].to_string());
    }
    Ok(flags)
}

fn register(hub: &TradeHub, args: &[&str]) {
    let flags = match parse_flags(args) {
        Ok(flags) => flags,
        Err(msg) => {
            println!("{msg} Example: register --username alice --password 1234");
            return;
        }
    };
    let (Some(username), Some(password)) = (flags.get("username"), flags.get("password")) else {
        println!("Both --username and --password are required.");
        return;
    };

    match hub.register(username, password) {
        Ok(user) => println!(
            "User '{}' registered (id={}). Log in with: login --username {} --password ****",
            user.username(),
            user.user_id(),
            user.username()
        ),
        Err(e) => println!("{e}"),
    }
}

fn login(hub: &TradeHub, args: &[&str], session: &mut Option<User>) {
    let flags = match parse_flags(args) {
        Ok(flags) => flags,
        Err(msg) => {
            println!("{msg} Example: login --username alice --password 1234");
            return;
        }
    };
    let (Some(username), Some(password)) = (flags.get("username"), flags.get("password")) else {
        println!("Both --username and --password are required.");
        return;
    };

    match hub.login(username, password) {
        Ok(user) => {
            println!("Logged in as '{}'.", user.username());
            *session = Some(user);
        }
        Err(e) => println!("{e}"),
    }
}

async fn show_portfolio(hub: &TradeHub, args: &[&str], session: Option<&User>) {
    let Some(user) = session else {
        println!("Log in first.");
        return;
    };
    let flags = match parse_flags(args) {
        Ok(flags) => flags,
        Err(msg) => {
            println!("{msg}");
            return;
        }
    };
    let base = flags.get("base").map(String::as_str).unwrap_or("USD");

    match hub.portfolio_valuation(user.user_id(), base).await {
        Ok(valuation) => {
            if valuation.positions.is_empty() {
                println!("You have no wallets yet.");
                return;
            }
            println!(
                "Portfolio of '{}' (base: {}):",
                user.username(),
                valuation.base_currency
            );
            for position in &valuation.positions {
                match position.value_in_base {
                    Some(value) => println!(
                        "- {}: {:.4}  =  {:.2} {}",
                        position.currency_code, position.balance, value, valuation.base_currency
                    ),
                    None => println!(
                        "- {}: {:.4}  =  n/a",
                        position.currency_code, position.balance
                    ),
                }
            }
            println!("{}", "-".repeat(40));
            println!(
                "TOTAL: {:.2} {}",
                valuation.total_value, valuation.base_currency
            );
        }
        Err(CoreError::PortfolioNotFound(_)) => println!("You have no wallets yet."),
        Err(e) => println!("{e}"),
    }
}

async fn trade(hub: &TradeHub, args: &[&str], session: Option<&User>, side: TradeSide) {
    let Some(user) = session else {
        println!("Log in first.");
        return;
    };
    let flags = match parse_flags(args) {
        Ok(flags) => flags,
        Err(msg) => {
            println!("{msg} Example: buy --currency BTC --amount 0.5");
            return;
        }
    };
    let (Some(currency), Some(amount)) = (flags.get("currency"), flags.get("amount")) else {
        println!("Both --currency and --amount are required.");
        return;
    };
    let Ok(amount) = amount.parse::<f64>() else {
        println!("'{amount}' is not a valid amount.");
        return;
    };

    let result = match side {
        TradeSide::Buy => hub.buy(user.user_id(), currency, amount).await,
        TradeSide::Sell => hub.sell(user.user_id(), currency, amount).await,
    };
    match result {
        Ok(receipt) => print_receipt(&receipt),
        Err(e) => println!("{e}"),
    }
}

fn print_receipt(receipt: &TradeReceipt) {
    let verb = match receipt.side {
        TradeSide::Buy => "Bought",
        TradeSide::Sell => "Sold",
    };
    match (receipt.rate, receipt.estimated_value) {
        (Some(rate), Some(value)) => println!(
            "{verb} {:.4} {} @ {rate} = {value:.2} USD (balance: {:.4} {})",
            receipt.amount, receipt.currency_code, receipt.new_balance, receipt.currency_code
        ),
        _ => println!(
            "{verb} {:.4} {} (value estimate unavailable; balance: {:.4} {})",
            receipt.amount, receipt.currency_code, receipt.new_balance, receipt.currency_code
        ),
    }
}

async fn get_rate(hub: &TradeHub, args: &[&str]) {
    let flags = match parse_flags(args) {
        Ok(flags) => flags,
        Err(msg) => {
            println!("{msg} Example: get-rate --from BTC --to USD");
            return;
        }
    };
    let (Some(from), Some(to)) = (flags.get("from"), flags.get("to")) else {
        println!("Both --from and --to are required.");
        return;
    };

    match hub.get_rate(from, to).await {
        Ok(quote) => println!(
            "Rate {}: {:.8} (updated: {})",
            quote.pair, quote.rate, quote.observed_at
        ),
        Err(e) => println!("{e}"),
    }
}

async fn update_rates(hub: &TradeHub) {
    match hub.update_rates().await {
        Ok(report) => println!(
            "Updated {} rates ({} sources failed).",
            report.updated, report.failed_adapters
        ),
        Err(e) => println!("Update failed: {e}"),
    }
}

fn show_rates(hub: &TradeHub) {
    match hub.cached_rates() {
        Ok(document) => {
            if document.pairs.is_empty() {
                println!("Rate cache is empty. Run 'update-rates' first.");
                return;
            }
            match document.last_refresh {
                Some(at) => println!("Rates from cache (updated at {at}):"),
                None => println!("Rates from cache:"),
            }
            let mut keys: Vec<&String> = document.pairs.keys().collect();
            keys.sort();
            for key in keys {
                let entry = &document.pairs[key];
                println!("- {key}: {:.5} ({})", entry.rate, entry.source);
            }
        }
        Err(e) => println!("Failed to read the rate cache: {e}"),
    }
}
