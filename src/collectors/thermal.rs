//! Temperature sensor collector.
//!
//! On Linux readings come from:
//! - /sys/class/hwmon/hwmon*/temp*_{input,label,max,crit}
//! - /sys/class/thermal/thermal_zone*/ when hwmon exposes nothing
//!
//! Other platforms use the `sysinfo` component list.

use super::HostPaths;
use crate::error::ProbeError;
use crate::format::{celsius, optional_celsius, NOT_AVAILABLE};
use crate::section::Section;

pub const NOT_SUPPORTED: &str = "Temperature monitoring not available";
pub const NO_SENSORS: &str = "No temperature sensors detected";

/// One temperature reading in degrees Celsius.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub label: Option<String>,
    pub current: f64,
    pub high: Option<f64>,
    pub critical: Option<f64>,
}

impl SensorReading {
    pub fn to_section(&self) -> Section {
        let mut section = Section::new();
        section.text(
            "label",
            self.label
                .as_deref()
                .filter(|l| !l.is_empty())
                .unwrap_or(NOT_AVAILABLE),
        );
        section.text("current", celsius(self.current));
        section.text("high", optional_celsius(self.high));
        section.text("critical", optional_celsius(self.critical));
        section
    }
}

/// Readings of one sensor chip.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorGroup {
    pub name: String,
    pub readings: Vec<SensorReading>,
}

/// Appends readings to the group called `name`, creating it in first-seen order.
fn merge_into(groups: &mut Vec<SensorGroup>, name: String, readings: Vec<SensorReading>) {
    match groups.iter_mut().find(|g| g.name == name) {
        Some(group) => group.readings.extend(readings),
        None => groups.push(SensorGroup { name, readings }),
    }
}

/// Builds the temperature section from a sensor query result.
pub fn temperature_section(result: Result<Vec<SensorGroup>, ProbeError>) -> Section {
    match result {
        Err(e) => {
            tracing::warn!("Temperature query failed: {}", e);
            Section::single("Status", NOT_SUPPORTED)
        }
        Ok(groups) if groups.is_empty() => Section::single("Status", NO_SENSORS),
        Ok(groups) => {
            let mut section = Section::new();
            for group in groups {
                let readings = group.readings.iter().map(SensorReading::to_section).collect();
                section.list(group.name, readings);
            }
            section
        }
    }
}

/// Millidegrees file to degrees.
fn read_millidegrees(path: &std::path::Path) -> Result<f64, ProbeError> {
    super::read_number(path).map(|m| m as f64 / 1000.0)
}

/// Sorted entries of `dir` whose names start with `prefix`.
fn sorted_entries(dir: &std::path::Path, prefix: &str) -> Result<Vec<std::path::PathBuf>, ProbeError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ProbeError::from_io(dir, e))?;
    let mut paths: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with(prefix))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Reads temperature groups from hardware monitoring devices.
///
/// Devices sharing a chip name are merged into one group.
pub fn read_hwmon_groups(paths: &HostPaths) -> Result<Vec<SensorGroup>, ProbeError> {
    let hwmon_base = paths.sys("class/hwmon");
    let mut groups = Vec::new();

    if !hwmon_base.exists() {
        return Ok(groups); // No hwmon devices available
    }

    for path in sorted_entries(&hwmon_base, "hwmon")? {
        let hwmon_name = match path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => continue,
        };

        let device_name = super::read_trimmed(&path.join("name")).unwrap_or(hwmon_name);

        // temp<N>_input files, ordered by N
        let mut indices: Vec<u32> = match std::fs::read_dir(&path) {
            Ok(entries) => entries
                .flatten()
                .filter_map(|e| {
                    let name = e.file_name().to_string_lossy().to_string();
                    name.strip_prefix("temp")?
                        .strip_suffix("_input")?
                        .parse::<u32>()
                        .ok()
                })
                .collect(),
            Err(_) => continue,
        };
        indices.sort_unstable();

        let mut readings = Vec::new();
        for idx in indices {
            let current = match read_millidegrees(&path.join(format!("temp{}_input", idx))) {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!("Skipping {} temp{}: {}", device_name, idx, e);
                    continue;
                }
            };

            readings.push(SensorReading {
                label: super::read_trimmed(&path.join(format!("temp{}_label", idx))).ok(),
                current,
                high: read_millidegrees(&path.join(format!("temp{}_max", idx))).ok(),
                critical: read_millidegrees(&path.join(format!("temp{}_crit", idx))).ok(),
            });
        }

        if !readings.is_empty() {
            merge_into(&mut groups, device_name, readings);
        }
    }

    Ok(groups)
}

/// Reads temperature groups from ACPI thermal zones, keyed by zone type.
pub fn read_thermal_zones(paths: &HostPaths) -> Result<Vec<SensorGroup>, ProbeError> {
    let thermal_base = paths.sys("class/thermal");
    let mut groups = Vec::new();

    if !thermal_base.exists() {
        return Ok(groups); // No thermal zones available
    }

    for path in sorted_entries(&thermal_base, "thermal_zone")? {
        let current = match read_millidegrees(&path.join("temp")) {
            Ok(c) => c,
            Err(_) => continue,
        };
        let zone_type = match super::read_trimmed(&path.join("type")) {
            Ok(t) => t,
            Err(_) => continue,
        };

        let mut high = None;
        let mut critical = None;
        for trip in 0.. {
            let trip_type = match super::read_trimmed(&path.join(format!("trip_point_{}_type", trip))) {
                Ok(t) => t,
                Err(_) => break,
            };
            let trip_temp = read_millidegrees(&path.join(format!("trip_point_{}_temp", trip))).ok();
            match trip_type.as_str() {
                "critical" => critical = trip_temp,
                "high" => high = trip_temp,
                _ => {}
            }
        }

        merge_into(
            &mut groups,
            zone_type,
            vec![SensorReading {
                label: None,
                current,
                high,
                critical,
            }],
        );
    }

    Ok(groups)
}

/// Collects all temperature groups: hwmon first, thermal zones as fallback.
#[cfg(target_os = "linux")]
pub fn collect_temperatures(paths: &HostPaths) -> Result<Vec<SensorGroup>, ProbeError> {
    let groups = read_hwmon_groups(paths)?;
    if !groups.is_empty() {
        return Ok(groups);
    }
    read_thermal_zones(paths)
}

/// Collects temperature groups from the provider's component list.
///
/// Components are grouped by the first word of their label.
#[cfg(not(target_os = "linux"))]
pub fn collect_temperatures(_paths: &HostPaths) -> Result<Vec<SensorGroup>, ProbeError> {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return Err(ProbeError::Unsupported);
    }

    let components = sysinfo::Components::new_with_refreshed_list();
    let mut groups = Vec::new();
    for component in components.list() {
        let current = component.temperature() as f64;
        if current.is_nan() {
            continue;
        }
        let (group, label) = split_component_label(component.label());
        merge_into(
            &mut groups,
            group,
            vec![SensorReading {
                label,
                current,
                high: None,
                critical: component.critical().map(f64::from),
            }],
        );
    }
    Ok(groups)
}

/// `"coretemp Package id 0"` -> (`"coretemp"`, `Some("Package id 0")`).
pub fn split_component_label(label: &str) -> (String, Option<String>) {
    match label.trim().split_once(char::is_whitespace) {
        Some((group, rest)) => (group.to_string(), Some(rest.trim().to_string())),
        None => (label.trim().to_string(), None),
    }
}
