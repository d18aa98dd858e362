//! Unit conversion: `10 km to miles`, `30°c to °f`, `5'10"`, `57lbs`.
//!
//! Every unit is a linear map onto its family's base unit
//! (`base = value * factor + offset`); only temperatures carry an offset.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use runbar_types::ExecutableCommand;

use crate::format::{format_number, round_to_precision, synthetic_result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Length,
    Mass,
    Temperature,
    Volume,
    Area,
    Speed,
    Data,
    Pressure,
    Time,
}

#[derive(Debug)]
pub struct Unit {
    pub name: &'static str,
    pub plural: &'static str,
    pub family: Family,
    factor: f64,
    offset: f64,
    aliases: &'static [&'static str],
}

impl Unit {
    const fn linear(
        name: &'static str,
        plural: &'static str,
        family: Family,
        factor: f64,
        aliases: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            plural,
            family,
            factor,
            offset: 0.0,
            aliases,
        }
    }

    fn to_base(&self, value: f64) -> f64 {
        value * self.factor + self.offset
    }

    fn from_base(&self, base: f64) -> f64 {
        (base - self.offset) / self.factor
    }

    fn display(&self, value: f64) -> &'static str {
        if round_to_precision(value).abs() == 1.0 { self.name } else { self.plural }
    }
}

const DAY: f64 = 86_400.0;

static UNITS: &[Unit] = &[
    // length, base meter
    Unit::linear("millimeter", "millimeters", Family::Length, 0.001, &["mm", "millimetre", "millimetres"]),
    Unit::linear("centimeter", "centimeters", Family::Length, 0.01, &["cm", "centimetre", "centimetres"]),
    Unit::linear("meter", "meters", Family::Length, 1.0, &["m", "metre", "metres"]),
    Unit::linear("kilometer", "kilometers", Family::Length, 1000.0, &["km", "kms", "kilometre", "kilometres"]),
    Unit::linear("inch", "inches", Family::Length, 0.0254, &["in", "\""]),
    Unit::linear("foot", "feet", Family::Length, 0.3048, &["ft", "'"]),
    Unit::linear("yard", "yards", Family::Length, 0.9144, &["yd", "yds"]),
    Unit::linear("mile", "miles", Family::Length, 1609.344, &["mi"]),
    Unit::linear("nautical mile", "nautical miles", Family::Length, 1852.0, &["nmi"]),
    // mass, base kilogram
    Unit::linear("milligram", "milligrams", Family::Mass, 1e-6, &["mg"]),
    Unit::linear("gram", "grams", Family::Mass, 0.001, &["g", "gramme", "grammes"]),
    Unit::linear("kilogram", "kilograms", Family::Mass, 1.0, &["kg", "kgs", "kilo", "kilos"]),
    Unit::linear("tonne", "tonnes", Family::Mass, 1000.0, &["t", "metric ton", "metric tons"]),
    Unit::linear("pound", "pounds", Family::Mass, 0.45359237, &["lb", "lbs"]),
    Unit::linear("ounce", "ounces", Family::Mass, 0.028349523125, &["oz"]),
    Unit::linear("stone", "stones", Family::Mass, 6.35029318, &["st"]),
    // temperature, base kelvin
    Unit {
        name: "degree celsius",
        plural: "degrees celsius",
        family: Family::Temperature,
        factor: 1.0,
        offset: 273.15,
        aliases: &["c", "celsius", "centigrade", "degc"],
    },
    Unit {
        name: "degree fahrenheit",
        plural: "degrees fahrenheit",
        family: Family::Temperature,
        factor: 5.0 / 9.0,
        offset: 459.67 * 5.0 / 9.0,
        aliases: &["f", "fahrenheit", "degf"],
    },
    Unit::linear("kelvin", "kelvin", Family::Temperature, 1.0, &["k", "kelvins"]),
    // volume, base liter
    Unit::linear("milliliter", "milliliters", Family::Volume, 0.001, &["ml", "millilitre", "millilitres"]),
    Unit::linear("centiliter", "centiliters", Family::Volume, 0.01, &["cl", "centilitre", "centilitres"]),
    Unit::linear("deciliter", "deciliters", Family::Volume, 0.1, &["dl", "decilitre", "decilitres"]),
    Unit::linear("liter", "liters", Family::Volume, 1.0, &["l", "litre", "litres"]),
    Unit::linear("cubic meter", "cubic meters", Family::Volume, 1000.0, &["m3", "m³", "cubic metre", "cubic metres"]),
    Unit::linear("gallon", "gallons", Family::Volume, 3.785411784, &["gal", "gals"]),
    Unit::linear("quart", "quarts", Family::Volume, 0.946352946, &["qt", "qts"]),
    Unit::linear("pint", "pints", Family::Volume, 0.473176473, &["pt", "pts"]),
    Unit::linear("cup", "cups", Family::Volume, 0.2365882365, &[]),
    Unit::linear(
        "fluid ounce",
        "fluid ounces",
        Family::Volume,
        0.0295735295625,
        &["fl oz", "floz", "fl. oz", "fl ounce", "fl ounces"],
    ),
    Unit::linear("tablespoon", "tablespoons", Family::Volume, 0.01478676478125, &["tbsp"]),
    Unit::linear("teaspoon", "teaspoons", Family::Volume, 0.00492892159375, &["tsp"]),
    // area, base square meter
    Unit::linear("square centimeter", "square centimeters", Family::Area, 1e-4, &["cm2", "cm²", "sq cm"]),
    Unit::linear(
        "square meter",
        "square meters",
        Family::Area,
        1.0,
        &["m2", "m²", "sq m", "sqm", "square metre", "square metres"],
    ),
    Unit::linear("square kilometer", "square kilometers", Family::Area, 1e6, &["km2", "km²", "sq km"]),
    Unit::linear("square inch", "square inches", Family::Area, 0.00064516, &["in2", "in²", "sq in"]),
    Unit::linear("square foot", "square feet", Family::Area, 0.09290304, &["ft2", "ft²", "sq ft", "sqft"]),
    Unit::linear("square yard", "square yards", Family::Area, 0.83612736, &["yd2", "yd²", "sq yd"]),
    Unit::linear("square mile", "square miles", Family::Area, 2_589_988.110336, &["mi2", "mi²", "sq mi"]),
    Unit::linear("acre", "acres", Family::Area, 4046.8564224, &["ac"]),
    Unit::linear("hectare", "hectares", Family::Area, 10_000.0, &["ha"]),
    // speed, base meter per second
    Unit::linear("meter per second", "meters per second", Family::Speed, 1.0, &["m/s", "mps"]),
    Unit::linear(
        "kilometer per hour",
        "kilometers per hour",
        Family::Speed,
        1.0 / 3.6,
        &["km/h", "kph", "kmh", "kmph", "kilometres per hour"],
    ),
    Unit::linear("mile per hour", "miles per hour", Family::Speed, 0.44704, &["mph"]),
    Unit::linear("foot per second", "feet per second", Family::Speed, 0.3048, &["ft/s", "fps"]),
    Unit::linear("knot", "knots", Family::Speed, 1852.0 / 3600.0, &["kn", "kt", "kts"]),
    // digital storage, base byte (SI prefixes)
    Unit::linear("bit", "bits", Family::Data, 0.125, &[]),
    Unit::linear("byte", "bytes", Family::Data, 1.0, &["b"]),
    Unit::linear("kilobyte", "kilobytes", Family::Data, 1e3, &["kb"]),
    Unit::linear("megabyte", "megabytes", Family::Data, 1e6, &["mb"]),
    Unit::linear("gigabyte", "gigabytes", Family::Data, 1e9, &["gb"]),
    Unit::linear("terabyte", "terabytes", Family::Data, 1e12, &["tb"]),
    Unit::linear("petabyte", "petabytes", Family::Data, 1e15, &["pb"]),
    Unit::linear("kibibyte", "kibibytes", Family::Data, 1024.0, &["kib"]),
    Unit::linear("mebibyte", "mebibytes", Family::Data, 1_048_576.0, &["mib"]),
    Unit::linear("gibibyte", "gibibytes", Family::Data, 1_073_741_824.0, &["gib"]),
    Unit::linear("tebibyte", "tebibytes", Family::Data, 1_099_511_627_776.0, &["tib"]),
    // pressure, base pascal
    Unit::linear("pascal", "pascals", Family::Pressure, 1.0, &["pa"]),
    Unit::linear("hectopascal", "hectopascals", Family::Pressure, 100.0, &["hpa"]),
    Unit::linear("kilopascal", "kilopascals", Family::Pressure, 1000.0, &["kpa"]),
    Unit::linear("millibar", "millibars", Family::Pressure, 100.0, &["mbar"]),
    Unit::linear("bar", "bars", Family::Pressure, 100_000.0, &[]),
    Unit::linear("atmosphere", "atmospheres", Family::Pressure, 101_325.0, &["atm"]),
    Unit::linear("pound per square inch", "pounds per square inch", Family::Pressure, 6894.757293168, &["psi"]),
    Unit::linear("millimeter of mercury", "millimeters of mercury", Family::Pressure, 133.322387415, &["mmhg"]),
    // time, base second; month and year are calendar-naive
    Unit::linear("millisecond", "milliseconds", Family::Time, 0.001, &["ms"]),
    Unit::linear("second", "seconds", Family::Time, 1.0, &["s", "sec", "secs"]),
    Unit::linear("minute", "minutes", Family::Time, 60.0, &["min", "mins"]),
    Unit::linear("hour", "hours", Family::Time, 3600.0, &["h", "hr", "hrs"]),
    Unit::linear("day", "days", Family::Time, DAY, &["d"]),
    Unit::linear("week", "weeks", Family::Time, 7.0 * DAY, &["wk", "wks"]),
    Unit::linear("month", "months", Family::Time, 30.0 * DAY, &["mo", "mos"]),
    Unit::linear("year", "years", Family::Time, 365.0 * DAY, &["y", "yr", "yrs"]),
];

/// Target picked when only a source unit is given.
const COMPLEMENTS: &[(&str, &str)] = &[
    ("kilometer", "mile"),
    ("mile", "kilometer"),
    ("meter", "foot"),
    ("foot", "meter"),
    ("centimeter", "inch"),
    ("inch", "centimeter"),
    ("millimeter", "inch"),
    ("kilogram", "pound"),
    ("pound", "kilogram"),
    ("gram", "ounce"),
    ("ounce", "gram"),
    ("liter", "gallon"),
    ("gallon", "liter"),
    ("milliliter", "fluid ounce"),
    ("fluid ounce", "milliliter"),
    ("degree celsius", "degree fahrenheit"),
    ("degree fahrenheit", "degree celsius"),
    ("kelvin", "degree celsius"),
    ("square meter", "square foot"),
    ("square foot", "square meter"),
    ("hectare", "acre"),
    ("acre", "hectare"),
    ("kilometer per hour", "mile per hour"),
    ("mile per hour", "kilometer per hour"),
    ("bar", "pound per square inch"),
    ("pound per square inch", "bar"),
];

static LOOKUP: Lazy<HashMap<&'static str, &'static Unit>> = Lazy::new(|| {
    let mut lookup = HashMap::new();
    for unit in UNITS {
        for key in [unit.name, unit.plural].into_iter().chain(unit.aliases.iter().copied()) {
            lookup.entry(key).or_insert(unit);
        }
    }
    lookup
});

static FEET_INCHES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\d+(?:\.\d+)?)'\s*(?:(\d+(?:\.\d+)?)\s*"?)?\s*(?:(?:to|in|into|as)\s+(.+))?$"#)
        .expect("valid feet/inches pattern")
});
static INCHES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\d+(?:\.\d+)?)"\s*(?:(?:to|in|into|as)\s+(.+))?$"#).expect("valid inches pattern")
});
static EXPLICIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?\d+(?:\.\d+)?)\s*(.+?)\s+(?:to|in|into|as)\s+(.+)$").expect("valid conversion pattern")
});
static SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?\d+(?:\.\d+)?)\s*(.+)$").expect("valid magnitude pattern"));

/// Resolve a unit by name, plural or alias, tolerating degree signs and case.
pub fn lookup_unit(text: &str) -> Option<&'static Unit> {
    let mut key = text.trim().trim_end_matches('.').to_lowercase().replace('°', "");
    for prefix in ["degrees ", "degree "] {
        if let Some(rest) = key.strip_prefix(prefix) {
            key = rest.to_string();
        }
    }
    let key = key.split_whitespace().collect::<Vec<_>>().join(" ");
    LOOKUP.get(key.as_str()).copied()
}

fn complement_of(unit: &Unit) -> Option<&'static Unit> {
    COMPLEMENTS
        .iter()
        .find(|(from, _)| *from == unit.name)
        .and_then(|(_, to)| lookup_unit(to))
}

/// Ounces are mass, fluid ounces volume; pick whichever matches the other side.
fn reconcile(from: &'static Unit, to: &'static Unit) -> Option<(&'static Unit, &'static Unit)> {
    let swap = |unit: &'static Unit, other: Family| -> &'static Unit {
        match (unit.name, other) {
            ("ounce", Family::Volume) => lookup_unit("fluid ounce").unwrap_or(unit),
            ("fluid ounce", Family::Mass) => lookup_unit("ounce").unwrap_or(unit),
            _ => unit,
        }
    };
    let from = swap(from, to.family);
    let to = swap(to, from.family);
    (from.family == to.family).then_some((from, to))
}

/// Convert `value` between two units of the same family.
pub fn convert(value: f64, from: &Unit, to: &Unit) -> Option<f64> {
    if from.family != to.family {
        return None;
    }
    let converted = to.from_base(from.to_base(value));
    converted.is_finite().then_some(converted)
}

pub fn parse_unit_conversion(query: &str) -> Vec<ExecutableCommand> {
    resolve(query)
        .map(|(value, unit)| {
            let number = format_number(value);
            synthetic_result(format!("{number} {}", unit.display(value)), number)
        })
        .into_iter()
        .collect()
}

fn normalize(query: &str) -> String {
    let mut text = query.trim().to_lowercase();
    for (from, to) in [('’', '\''), ('‘', '\''), ('′', '\''), ('`', '\''), ('″', '"'), ('”', '"'), ('“', '"')] {
        text = text.replace(from, &to.to_string());
    }
    text = text.replace("''", "\"");
    match text.strip_prefix("convert ") {
        Some(rest) => rest.trim().to_string(),
        None => text,
    }
}

fn resolve(query: &str) -> Option<(f64, &'static Unit)> {
    let text = normalize(query);

    if let Some(captures) = FEET_INCHES.captures(&text) {
        let feet: f64 = captures[1].parse().ok()?;
        let inches: f64 = match captures.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0.0,
        };
        return convert_imperial_height(feet * 12.0 + inches, captures.get(3).map(|m| m.as_str()));
    }
    if let Some(captures) = INCHES.captures(&text) {
        let inches: f64 = captures[1].parse().ok()?;
        return convert_imperial_height(inches, captures.get(2).map(|m| m.as_str()));
    }
    if let Some(captures) = EXPLICIT.captures(&text) {
        let value: f64 = captures[1].parse().ok()?;
        let (from, to) = reconcile(lookup_unit(&captures[2])?, lookup_unit(&captures[3])?)?;
        return Some((convert(value, from, to)?, to));
    }
    let captures = SINGLE.captures(&text)?;
    let value: f64 = captures[1].parse().ok()?;
    let from = lookup_unit(&captures[2])?;
    let to = complement_of(from)?;
    Some((convert(value, from, to)?, to))
}

fn convert_imperial_height(inches: f64, target: Option<&str>) -> Option<(f64, &'static Unit)> {
    let from = lookup_unit("inch")?;
    let to = match target {
        Some(text) => lookup_unit(text)?,
        None => lookup_unit("centimeter")?,
    };
    Some((convert(inches, from, to)?, to))
}
