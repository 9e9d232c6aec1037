use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for the display layer
    let mut types = Vec::new();

    // Extraction types
    types.push(clean_type(InputModality::export_to_string()?));
    types.push(clean_type(InputRecord::export_to_string()?));
    types.push(clean_type(Priority::export_to_string()?));
    types.push(clean_type(ExtractionPath::export_to_string()?));
    types.push(clean_type(NormalizedValue::export_to_string()?));
    types.push(clean_type(ExtractionResult::export_to_string()?));

    // Delegation types
    types.push(clean_type(DelegationStatus::export_to_string()?));
    types.push(clean_type(DelegationToken::export_to_string()?));
    types.push(clean_type(CalendarEvent::export_to_string()?));
    types.push(clean_type(ProcessingStatus::export_to_string()?));
    types.push(clean_type(AgentCommunication::export_to_string()?));
    types.push(clean_type(CommunicationHistoryResponse::export_to_string()?));

    let output_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "../web/src/api-types".to_string());
    let output_dir = Path::new(&output_dir);
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // All types land in one file, so cross-type imports are dropped
    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
