//! Renders the single instruction prompt handed to the text generator.
//!
//! [`render`] is a pure function: no clock reads, no I/O, no global state.
//! Identical inputs give byte-identical output.

use chrono::NaiveDateTime;

use crate::model::{ForecastStep, ForecastWindow, WardrobeText};

/// Chance of precipitation at or above which rain gear must be recommended.
pub const RAIN_GEAR_THRESHOLD: f64 = 0.5;

pub const WARDROBE_BEGIN: &str = "<<<WARDROBE>>>";
pub const WARDROBE_END: &str = "<<<END WARDROBE>>>";

const EMPTY_WINDOW_LINE: &str = "- No forecast data is available for the rest of today.";

const DIRECTIVES: &[&str] = &[
    "Begin the reply with a description of today's weather. Do not open with an acknowledgement such as \"Understood\" or \"Sure\".",
    "Never repeat the wardrobe boundary markers in the reply.",
    "Choose garments only from the wardrobe listed between the markers.",
    "Present the weather as a list, one item per time segment.",
    "Assume the user will not change clothes during the day. Propose one outfit for each likely activity window, such as the commute, daytime and the evening.",
    "If any time segment has a chance of rain of 50% or more, explicitly recommend rain gear.",
    "If the wardrobe has no suitable garment, say so explicitly before suggesting an alternative.",
];

fn percent(fraction: f64) -> u32 {
    (fraction * 100.0).round() as u32
}

fn time_label(at: &NaiveDateTime) -> String {
    at.format("%H:%M").to_string()
}

fn condition_text(step: &ForecastStep) -> String {
    match (step.description.is_empty(), step.condition_code.is_empty()) {
        (false, false) => format!("{} ({})", step.description, step.condition_code),
        (false, true) => step.description.clone(),
        (true, false) => step.condition_code.clone(),
        (true, true) => "unknown conditions".to_string(),
    }
}

/// One line of the weather summary. Feels-like and chance of rain appear only when known.
pub fn render_step(step: &ForecastStep) -> String {
    let mut line = format!(
        "- {} {}, {:.1}°C",
        time_label(&step.timestamp),
        condition_text(step),
        step.temperature_c
    );

    if let Some(feels_like) = step.feels_like_c {
        line.push_str(&format!(" (feels like {feels_like:.1}°C)"));
    }

    line.push_str(&format!(", precipitation {:.1} mm", step.precipitation_mm));

    if let Some(pop) = step.precipitation_probability {
        line.push_str(&format!(", chance of rain {}%", percent(pop)));
    }

    line
}

fn weather_section(window: &ForecastWindow) -> String {
    if window.is_empty() {
        return EMPTY_WINDOW_LINE.to_string();
    }

    window
        .steps()
        .iter()
        .map(render_step)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Steps that cross [`RAIN_GEAR_THRESHOLD`], as "15:00 (70%)" labels.
fn rainy_steps(window: &ForecastWindow) -> Vec<String> {
    window
        .steps()
        .iter()
        .filter_map(|step| {
            step.precipitation_probability
                .filter(|pop| *pop >= RAIN_GEAR_THRESHOLD)
                .map(|pop| format!("{} ({}%)", time_label(&step.timestamp), percent(pop)))
        })
        .collect()
}

pub fn render(
    now: NaiveDateTime,
    region: &str,
    locality: &str,
    window: &ForecastWindow,
    wardrobe: &WardrobeText,
) -> String {
    render_labeled(now, region, locality, window, wardrobe, None)
}

/// Like [`render`], with the forecast provider's own name for the place
/// appended to the `Location:` line when it reports one.
pub fn render_labeled(
    now: NaiveDateTime,
    region: &str,
    locality: &str,
    window: &ForecastWindow,
    wardrobe: &WardrobeText,
    provider_label: Option<&str>,
) -> String {
    let location = match provider_label {
        Some(label) if !label.trim().is_empty() => format!("{region} {locality} ({label})"),
        _ => format!("{region} {locality}"),
    };

    let rules = DIRECTIVES
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {rule}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "You are a stylist choosing today's clothes from the user's own wardrobe.\n\
         \n\
         Current time: {now}\n\
         Location: {location}\n\
         \n\
         Today's forecast:\n\
         {weather}\n\
         \n\
         Wardrobe:\n\
         {WARDROBE_BEGIN}\n\
         {wardrobe}\n\
         {WARDROBE_END}\n\
         \n\
         Rules:\n\
         {rules}\n",
        now = now.format("%Y-%m-%d %H:%M"),
        weather = weather_section(window),
    );

    let rainy = rainy_steps(window);
    if !rainy.is_empty() {
        prompt.push_str(&format!(
            "\nRain alert: the chance of rain reaches 50% or more at {}. \
             Recommend rain gear such as an umbrella or a raincoat.\n",
            rainy.join(", ")
        ));
    }

    prompt
}
