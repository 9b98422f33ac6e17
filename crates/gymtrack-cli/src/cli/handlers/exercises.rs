//! Muscle group and exercise listings

use super::build_client;
use crate::error::{CliError, Result};
use crate::output::{json_output, print_info};
use console::style;
use gymtrack_sdk::{ClientConfig, Exercise};

/// Handle groups command
pub async fn handle_groups(config: &ClientConfig, json: bool) -> Result<()> {
    let client = build_client(config)?;
    let groups = client
        .groups()
        .await
        .map_err(|e| CliError::api(e, "Could not load the muscle groups"))?;

    if json {
        return json_output(&groups);
    }
    if groups.is_empty() {
        print_info("No muscle groups available");
    }
    for group in &groups {
        println!("{group}");
    }
    Ok(())
}

/// Handle exercises command
pub async fn handle_exercises(config: &ClientConfig, group: &str, json: bool) -> Result<()> {
    let client = build_client(config)?;
    let exercises = client
        .exercises_by_group(group)
        .await
        .map_err(|e| CliError::api(e, "Could not load the exercises"))?;

    if json {
        return json_output(&exercises);
    }
    if exercises.is_empty() {
        print_info(&format!("No exercises for '{group}'"));
        return Ok(());
    }

    println!("{} ({})", style(group).bold(), exercises.len());
    for exercise in &exercises {
        println!("  {}", format_exercise_line(exercise));
    }
    Ok(())
}

/// Handle exercise command
pub async fn handle_exercise(config: &ClientConfig, id: u64, json: bool) -> Result<()> {
    let client = build_client(config)?;
    let exercise = client
        .exercise(id)
        .await
        .map_err(|e| CliError::api(e, "Could not load the exercise details"))?;

    if json {
        return json_output(&exercise);
    }
    println!("{}", style(&exercise.name).bold());
    println!("  Group:       {}", exercise.group);
    println!("  Series:      {}", exercise.series);
    println!("  Repetitions: {}", exercise.repetitions);
    if let Some(demo) = &exercise.demo {
        println!("  Demo:        {demo}");
    }
    Ok(())
}

fn format_exercise_line(exercise: &Exercise) -> String {
    format!(
        "#{:<4} {}  {} x {}",
        exercise.id, exercise.name, exercise.series, exercise.repetitions
    )
}
