//! Human and JSON renderings of command results.

use std::io::Write;

use aero_sync::{FlightResult, FlightResultReply, OverlayState, Team};
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn json_line<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn score(result: &FlightResult) -> String {
    result
        .score
        .map_or_else(|| "-".to_string(), |score| format!("{score:.1}"))
}

pub fn teams(out: &mut dyn Write, format: OutputFormat, teams: &[Team]) -> Result<()> {
    if format == OutputFormat::Json {
        return json_line(out, teams);
    }
    if teams.is_empty() {
        writeln!(out, "no teams")?;
        return Ok(());
    }
    for team in teams {
        writeln!(
            out,
            "{:<10} {:<28} battery {:<3} {}",
            team.id, team.name, team.current_battery, team.university
        )?;
    }
    Ok(())
}

pub fn team(out: &mut dyn Write, format: OutputFormat, team: &Team) -> Result<()> {
    if format == OutputFormat::Json {
        return json_line(out, team);
    }
    writeln!(out, "{} ({})", team.name, team.id)?;
    writeln!(out, "  university: {}", team.university)?;
    writeln!(out, "  current battery: {}", team.current_battery)?;
    if let Some(url) = &team.aircraft_photo_url {
        writeln!(out, "  photo: {url}")?;
    }
    if team.flight_results.is_empty() {
        writeln!(out, "  no results")?;
    }
    for result in &team.flight_results {
        write!(
            out,
            "  battery {:<3} {:<12} {:>5}",
            result.battery_number,
            result.status.label(),
            score(result)
        )?;
        match &result.notes {
            Some(notes) => writeln!(out, "  {notes}")?,
            None => writeln!(out)?,
        }
    }
    Ok(())
}

pub fn overlay_state(out: &mut dyn Write, format: OutputFormat, state: &OverlayState) -> Result<()> {
    if format == OutputFormat::Json {
        return json_line(out, state);
    }
    let flag = |on: bool| if on { "on" } else { "off" };
    writeln!(out, "visible: {}", if state.visible { "yes" } else { "no" })?;
    writeln!(out, "team: {}", state.active_team_id().unwrap_or("-"))?;
    writeln!(
        out,
        "sections: team info {}, results {}, battery {}",
        flag(state.show_team_info),
        flag(state.show_flight_results),
        flag(state.show_current_battery)
    )?;
    writeln!(out, "message: {}", state.custom_message.as_deref().unwrap_or("-"))?;
    Ok(())
}

pub fn flight_result_reply(
    out: &mut dyn Write,
    format: OutputFormat,
    reply: &FlightResultReply,
) -> Result<()> {
    match reply {
        FlightResultReply::Team(t) => team(out, format, t),
        FlightResultReply::Result(result) if format == OutputFormat::Json => json_line(out, result),
        FlightResultReply::Result(result) => {
            writeln!(
                out,
                "recorded battery {} {} {}",
                result.battery_number,
                result.status.label(),
                score(result)
            )?;
            Ok(())
        }
    }
}
