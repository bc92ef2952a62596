//! Config utils.

use std::collections::HashMap;
use std::str::FromStr;

use crate::core::resources::Resources;
use crate::error::VmpError;

/// Header line separating parameters from the list of scenario files.
pub const SCENARIOS_MARKER: &str = "SCENARIOS";

/// Parses config value string, which consists of two parts - name and options.
/// Example: ACO[ants=10,iterations=20] parts are name ACO and options string "ants=10,iterations=20".
pub fn parse_config_value(config_str: &str) -> (String, Option<String>) {
    match config_str.split_once('[') {
        Some((l, r)) => (l.trim().to_string(), Some(r.to_string().replace(']', ""))),
        None => (config_str.trim().to_string(), None),
    }
}

/// Parses options string from config value, returns map with option names and values.
///
/// # Examples
///
/// ```rust
/// use dslab_vmp::core::config::options::parse_options;
///
/// let options = parse_options("option1=0.8,option2=something");
/// assert_eq!(options.get("option1").unwrap(), "0.8");
/// assert_eq!(options.get("option2").unwrap(), "something");
/// assert_eq!(options.get("option3"), None);
/// ```
pub fn parse_options(options_str: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for option_str in options_str.split(',') {
        if let Some((name, value)) = option_str.split_once('=') {
            options.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    options
}

/// Splits a `KEY=VALUE` parameter file into parameters and scenario file names.
///
/// Empty lines and `#` comments are skipped. Lines without `=` (except the `SCENARIOS` marker)
/// name scenario files, in file order.
pub fn parse_parameters(content: &str) -> (HashMap<String, String>, Vec<String>) {
    let mut parameters = HashMap::new();
    let mut scenarios = Vec::new();
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                parameters.insert(key.trim().to_string(), value.trim().to_string());
            }
            None if line == SCENARIOS_MARKER => {}
            None => scenarios.push(line.to_string()),
        }
    }
    (parameters, scenarios)
}

/// Parses a single parameter value, reporting the key on failure.
pub fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, VmpError> {
    value.trim().parse::<T>().map_err(|_| VmpError::Config {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parses a boolean written as `true`/`false` or `1`/`0`.
pub fn parse_bool(key: &str, value: &str) -> Result<bool, VmpError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(VmpError::Config {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Parses a per-resource value: a single number applied to all resources or a list of three.
pub fn parse_resources(key: &str, value: &str) -> Result<Resources, VmpError> {
    let parts = value
        .replace(['[', ']'], "")
        .split(',')
        .map(|part| parse_value::<f64>(key, part))
        .collect::<Result<Vec<f64>, VmpError>>()?;
    match parts.as_slice() {
        [v] => Ok(Resources::splat(*v)),
        [cpu, ram, net] => Ok(Resources::new(*cpu, *ram, *net)),
        _ => Err(VmpError::Config {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameters() {
        let content = "ALGORITHM=3\nHEURISTIC_CODE=FFD\n\nSCENARIOS\nscenario_a.txt\nscenario_b.txt\n";
        let (parameters, scenarios) = parse_parameters(content);
        assert_eq!(parameters.get("ALGORITHM").unwrap(), "3");
        assert_eq!(parameters.get("HEURISTIC_CODE").unwrap(), "FFD");
        assert_eq!(scenarios, vec!["scenario_a.txt", "scenario_b.txt"]);
    }

    #[test]
    fn test_parse_resources() {
        assert_eq!(parse_resources("PF", "0.5").unwrap(), Resources::splat(0.5));
        assert_eq!(
            parse_resources("PF", "0.1, 0.2,0.3").unwrap(),
            Resources::new(0.1, 0.2, 0.3)
        );
        assert!(parse_resources("PF", "0.1,0.2").is_err());
        assert!(parse_resources("PF", "abc").is_err());
    }

    #[test]
    fn test_parse_config_value() {
        let (name, options) = parse_config_value("ACO[ants=4,iterations=2]");
        assert_eq!(name, "ACO");
        let options = parse_options(&options.unwrap());
        assert_eq!(options.get("ants").unwrap(), "4");
        assert_eq!(parse_config_value("MEMETIC"), ("MEMETIC".to_string(), None));
    }
}
