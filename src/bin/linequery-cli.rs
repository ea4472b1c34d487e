use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};

use linequery::net::tls;
use linequery::observability::logging;
use linequery::protocol::verdict_token;
use linequery::{ClientError, QueryClient};

#[derive(Parser)]
#[command(name = "linequery-cli")]
#[command(about = "Query a linequery server for exact lines", long_about = None)]
struct Cli {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:44445")]
    addr: String,

    /// PEM bundle to trust; enables TLS
    #[arg(long)]
    tls_ca: Option<PathBuf>,

    /// Name expected in the server certificate (defaults to the host in --addr)
    #[arg(long)]
    server_name: Option<String>,

    /// Print one JSON object per answer
    #[arg(long)]
    json: bool,

    /// Queries to send; reads lines from stdin when empty
    queries: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_cli("warn")?;

    match &cli.tls_ca {
        Some(ca) => {
            let connector = tls::load_connector(ca)?;
            let name = cli
                .server_name
                .clone()
                .unwrap_or_else(|| host_of(&cli.addr).to_string());
            let client = QueryClient::connect_tls(&cli.addr, &connector, &name).await?;
            run(client, &cli).await?;
        }
        None => {
            let client = QueryClient::connect(&cli.addr).await?;
            run(client, &cli).await?;
        }
    }

    Ok(())
}

/// Host part of `host:port`, without IPv6 brackets.
fn host_of(addr: &str) -> &str {
    let host = addr.rsplit_once(':').map_or(addr, |(host, _)| host);
    host.trim_start_matches('[').trim_end_matches(']')
}

async fn run<S>(mut client: QueryClient<S>, cli: &Cli) -> Result<(), ClientError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if !cli.queries.is_empty() {
        for query in &cli.queries {
            ask(&mut client, query, cli.json).await?;
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("Connected to {}. Type a line to look up, or 'exit' to quit.", cli.addr);
    while let Some(line) = lines.next_line().await? {
        match classify_input(&line) {
            Input::Exit => break,
            Input::Blank => continue,
            Input::Query(query) => ask(&mut client, query, cli.json).await?,
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Blank,
    Query(&'a str),
}

/// Interactive input: `exit` in any case quits, blank lines are skipped.
fn classify_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("exit") {
        Input::Exit
    } else if trimmed.is_empty() {
        Input::Blank
    } else {
        Input::Query(line)
    }
}

async fn ask<S>(client: &mut QueryClient<S>, query: &str, as_json: bool) -> Result<(), ClientError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let start = Instant::now();
    let verdict = client.query(query).await?;
    let elapsed = start.elapsed();

    if as_json {
        let answer = json!({
            "query": query,
            "verdict": verdict.as_str(),
            "round_trip_ms": elapsed.as_secs_f64() * 1000.0,
        });
        println!("{}", answer);
    } else {
        print!("{}", verdict_token(verdict));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_extraction() {
        assert_eq!(host_of("localhost:44445"), "localhost");
        assert_eq!(host_of("[::1]:44445"), "::1");
        assert_eq!(host_of("example.com"), "example.com");
    }

    #[test]
    fn interactive_input() {
        assert_eq!(classify_input("exit"), Input::Exit);
        assert_eq!(classify_input("  EXIT "), Input::Exit);
        assert_eq!(classify_input(""), Input::Blank);
        assert_eq!(classify_input(" \t"), Input::Blank);
        assert_eq!(classify_input("Line 2"), Input::Query("Line 2"));
        assert_eq!(classify_input("exiting"), Input::Query("exiting"));
    }
}
