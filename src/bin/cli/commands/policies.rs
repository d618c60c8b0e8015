use anyhow::Result;

use heapcards_lib::scheduling::policy::{format_delay, DEFAULT_POLICY_ID};
use heapcards_lib::scheduling::{Heap, HeapPolicy, MAX_HEAP};

use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

/// Heaps shown in the delay preview
const PREVIEW_HEAPS: [u8; 5] = [1, 2, 3, 5, 15];

pub fn run(format: &OutputFormat, use_color: bool) -> Result<()> {
    let policies = HeapPolicy::catalog();

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = policies
                .iter()
                .map(|policy| {
                    let delays: Vec<i64> = (1..=MAX_HEAP)
                        .filter_map(|n| Heap::new(n).ok())
                        .filter_map(|heap| policy.delay(heap))
                        .map(|delay| delay.num_days())
                        .collect();
                    serde_json::json!({
                        "id": policy.id,
                        "name": policy.name,
                        "description": policy.description,
                        "isDefault": policy.id == DEFAULT_POLICY_ID,
                        "delayDays": delays,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            for policy in policies {
                let default = if policy.id == DEFAULT_POLICY_ID { " (default)" } else { "" };
                println!(
                    "{} {}{}",
                    paint(&policy.id.to_string(), Color::CYAN, use_color),
                    paint(policy.name, Color::BOLD, use_color),
                    default
                );
                println!("    {}", policy.description);

                let preview = PREVIEW_HEAPS
                    .iter()
                    .filter_map(|&n| Heap::new(n).ok())
                    .filter_map(|heap| policy.delay(heap).map(|d| format!("{}: {}", heap, format_delay(d))))
                    .collect::<Vec<_>>()
                    .join("  ");
                println!("    {}", paint(&preview, Color::DIM, use_color));
            }
        }
    }

    Ok(())
}
