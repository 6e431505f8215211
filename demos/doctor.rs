//! Example: Check site availability and search the reachable Japanese sites.

use tspider::{display, Config, Language, SearchOutcome, Spider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt::init();

    let spider = Spider::new(Config::default())?;

    let report = spider.doctor(None).await;
    print!("{}", display::doctor_table(&report));

    match spider.search("one piece", Language::Jp).await? {
        SearchOutcome::Found(collected) => {
            println!("{}", collected.summary());
            for (title, record) in collected.results.sorted_desc().into_iter().take(10) {
                println!("{}\n   {}", title, record.magnet);
            }
        }
        SearchOutcome::NoAvailableSources => println!("No available sites"),
    }

    Ok(())
}
