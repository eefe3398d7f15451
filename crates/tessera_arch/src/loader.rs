//! YAML loading for architecture descriptions.
//!
//! Description files live under the repository's
//! `architecture_descriptions/` directory, one per target fabric. The
//! loader parses the YAML into a mutable raw form, normalizes it into the
//! immutable [`ArchitectureDescription`], and validates it before returning.

use crate::description::{
    ArchitectureDescription, InterfaceImpl, ModuleTemplate, TemplateConn, TemplateParam,
    TemplatePort,
};
use crate::error::ArchError;
use crate::interface::{InterfaceId, InterfaceKind};
use crate::wiring::parse_wire_expr;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tessera_ir::PortDirection;

/// Loads and validates an architecture description from a YAML file.
///
/// If the file does not set a `name`, the file stem is used.
pub fn load_architecture(path: &Path) -> Result<ArchitectureDescription, ArchError> {
    let content = std::fs::read_to_string(path)?;
    let mut arch = load_architecture_from_str(&content)?;
    if arch.name.is_empty() {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            arch.name = stem.to_string();
        }
    }
    Ok(arch)
}

/// Parses and validates an architecture description from YAML text.
///
/// Useful for testing without filesystem dependencies.
pub fn load_architecture_from_str(content: &str) -> Result<ArchitectureDescription, ArchError> {
    let raw: RawArch =
        serde_yaml::from_str(content).map_err(|e| ArchError::Parse(e.to_string()))?;
    let arch = normalize(raw)?;
    arch.validate()?;
    Ok(arch)
}

// Raw, parser-facing form. Normalized into the immutable description
// before anything else sees it.

#[derive(Debug, Deserialize)]
struct RawArch {
    #[serde(default)]
    name: String,
    implementations: Vec<RawImpl>,
}

#[derive(Debug, Deserialize)]
struct RawImpl {
    interface: RawInterface,
    modules: Vec<RawModule>,
    #[serde(default)]
    internal_data: IndexMap<String, u32>,
    outputs: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawInterface {
    name: String,
    #[serde(default)]
    parameters: BTreeMap<String, u64>,
}

#[derive(Debug, Deserialize)]
struct RawModule {
    module_name: String,
    #[serde(default)]
    ports: Vec<RawPort>,
    #[serde(default)]
    parameters: Vec<RawParam>,
    #[serde(default)]
    filepath: String,
}

#[derive(Debug, Deserialize)]
struct RawPort {
    name: String,
    value: String,
    direction: String,
    bitwidth: u32,
}

#[derive(Debug, Deserialize)]
struct RawParam {
    name: String,
    value: String,
}

fn normalize(raw: RawArch) -> Result<ArchitectureDescription, ArchError> {
    let mut implementations = Vec::with_capacity(raw.implementations.len());
    for imp in raw.implementations {
        implementations.push(normalize_impl(imp)?);
    }
    Ok(ArchitectureDescription {
        name: raw.name,
        implementations,
    })
}

fn normalize_impl(raw: RawImpl) -> Result<InterfaceImpl, ArchError> {
    let kind = parse_kind(&raw.interface.name)?;
    let id = InterfaceId {
        kind,
        params: raw.interface.parameters,
    };

    if raw.modules.len() != 1 {
        return Err(ArchError::ModuleCount {
            interface: id.to_string(),
            count: raw.modules.len(),
        });
    }
    let raw_module = raw.modules.into_iter().next().unwrap();

    let mut ports = Vec::with_capacity(raw_module.ports.len());
    for p in raw_module.ports {
        let conn = match p.direction.as_str() {
            "input" => TemplateConn::Wired(parse_wire_expr(&p.value)?),
            "output" => TemplateConn::Named(p.value.trim().to_string()),
            other => {
                return Err(ArchError::UnknownDirection {
                    port: p.name,
                    direction: other.to_string(),
                })
            }
        };
        ports.push(TemplatePort {
            name: p.name,
            direction: match &conn {
                TemplateConn::Wired(_) => PortDirection::Input,
                TemplateConn::Named(_) => PortDirection::Output,
            },
            width: p.bitwidth,
            conn,
        });
    }

    let params = raw_module
        .parameters
        .into_iter()
        .map(|p| {
            Ok(TemplateParam {
                name: p.name,
                wiring: parse_wire_expr(&p.value)?,
            })
        })
        .collect::<Result<Vec<_>, ArchError>>()?;

    let outputs = raw
        .outputs
        .into_iter()
        .map(|(name, value)| Ok((name, parse_wire_expr(&value)?)))
        .collect::<Result<IndexMap<_, _>, ArchError>>()?;

    Ok(InterfaceImpl {
        id,
        module: ModuleTemplate {
            module_name: raw_module.module_name,
            ports,
            params,
            filepath: raw_module.filepath,
        },
        internal_state: raw.internal_data,
        outputs,
    })
}

fn parse_kind(name: &str) -> Result<InterfaceKind, ArchError> {
    if name.eq_ignore_ascii_case("LUT") {
        Ok(InterfaceKind::Lut)
    } else if name.eq_ignore_ascii_case("MUX") {
        Ok(InterfaceKind::Mux)
    } else if name.eq_ignore_ascii_case("carry") {
        Ok(InterfaceKind::Carry)
    } else {
        Err(ArchError::UnknownInterface(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LUT4_YAML: &str = r#"
name: test_fabric
implementations:
  - interface:
      name: LUT
      parameters: {num_inputs: 4}
    modules:
      - module_name: LUT4
        filepath: prims/LUT4.v
        ports:
          - {name: A, value: I0, direction: input, bitwidth: 1}
          - {name: B, value: I1, direction: input, bitwidth: 1}
          - {name: C, value: I2, direction: input, bitwidth: 1}
          - {name: D, value: I3, direction: input, bitwidth: 1}
          - {name: Z, value: Z, direction: output, bitwidth: 1}
        parameters:
          - {name: INIT, value: INIT}
    internal_data:
      INIT: 16
    outputs:
      O: Z
"#;

    #[test]
    fn parse_minimal_description() {
        let arch = load_architecture_from_str(LUT4_YAML).unwrap();
        assert_eq!(arch.name, "test_fabric");
        assert_eq!(arch.implementations.len(), 1);
        let imp = &arch.implementations[0];
        assert_eq!(imp.id, InterfaceId::lut(4));
        assert_eq!(imp.module.module_name, "LUT4");
        assert_eq!(imp.module.ports.len(), 5);
        assert_eq!(imp.internal_state.get("INIT"), Some(&16));
        assert!(imp.outputs.contains_key("O"));
    }

    #[test]
    fn carry_description_with_buses() {
        let yaml = r#"
implementations:
  - interface:
      name: carry
      parameters: {width: 2}
    modules:
      - module_name: CCU2C
        filepath: prims/CCU2C.v
        ports:
          - {name: CIN, value: CI, direction: input, bitwidth: 1}
          - {name: A0, value: (bit 0 DI), direction: input, bitwidth: 1}
          - {name: B0, value: (bit 0 S), direction: input, bitwidth: 1}
          - {name: A1, value: (bit 1 DI), direction: input, bitwidth: 1}
          - {name: B1, value: (bit 1 S), direction: input, bitwidth: 1}
          - {name: S0, value: S0, direction: output, bitwidth: 1}
          - {name: S1, value: S1, direction: output, bitwidth: 1}
          - {name: COUT, value: COUT, direction: output, bitwidth: 1}
        parameters:
          - {name: INIT0, value: INIT0}
          - {name: INIT1, value: INIT1}
    internal_data:
      INIT0: 16
      INIT1: 16
    outputs:
      O: (concat S1 S0)
      CO: COUT
"#;
        let arch = load_architecture_from_str(yaml).unwrap();
        let imp = &arch.implementations[0];
        assert_eq!(imp.id, InterfaceId::carry(2));
        assert_eq!(imp.internal_state.len(), 2);
        assert_eq!(imp.outputs.len(), 2);
    }

    #[test]
    fn missing_implementations_key_errors() {
        let err = load_architecture_from_str("name: x").unwrap_err();
        assert!(matches!(err, ArchError::Parse(_)));
    }

    #[test]
    fn missing_outputs_key_errors() {
        let yaml = r#"
implementations:
  - interface: {name: LUT, parameters: {num_inputs: 2}}
    modules:
      - module_name: LUT2
        ports:
          - {name: I0, value: I0, direction: input, bitwidth: 1}
          - {name: I1, value: I1, direction: input, bitwidth: 1}
          - {name: O, value: O, direction: output, bitwidth: 1}
"#;
        let err = load_architecture_from_str(yaml).unwrap_err();
        assert!(matches!(err, ArchError::Parse(_)));
    }

    #[test]
    fn two_modules_errors() {
        let yaml = r#"
implementations:
  - interface: {name: LUT, parameters: {num_inputs: 2}}
    modules:
      - module_name: LUT2
        ports: []
      - module_name: LUT2B
        ports: []
    outputs: {O: Z}
"#;
        let err = load_architecture_from_str(yaml).unwrap_err();
        assert!(matches!(err, ArchError::ModuleCount { count: 2, .. }));
    }

    #[test]
    fn unknown_direction_errors() {
        let yaml = r#"
implementations:
  - interface: {name: LUT, parameters: {num_inputs: 2}}
    modules:
      - module_name: LUT2
        ports:
          - {name: I0, value: I0, direction: inout, bitwidth: 1}
        parameters: []
    outputs: {O: Z}
"#;
        let err = load_architecture_from_str(yaml).unwrap_err();
        assert!(matches!(err, ArchError::UnknownDirection { .. }));
    }

    #[test]
    fn unknown_interface_kind_errors() {
        let yaml = r#"
implementations:
  - interface: {name: DSP, parameters: {width: 18}}
    modules:
      - module_name: DSP48
        ports: []
    outputs: {O: P}
"#;
        let err = load_architecture_from_str(yaml).unwrap_err();
        assert!(matches!(err, ArchError::UnknownInterface(name) if name == "DSP"));
    }

    #[test]
    fn wiring_parse_error_surfaces() {
        let yaml = r#"
implementations:
  - interface: {name: LUT, parameters: {num_inputs: 1}}
    modules:
      - module_name: BUF
        ports:
          - {name: A, value: (frob I0), direction: input, bitwidth: 1}
          - {name: Z, value: Z, direction: output, bitwidth: 1}
    outputs: {O: Z}
"#;
        let err = load_architecture_from_str(yaml).unwrap_err();
        assert!(matches!(err, ArchError::WiringParse { .. }));
    }

    #[test]
    fn validation_runs_on_load() {
        // The A port claims 2 bits but is wired to a 1-bit interface input.
        let yaml = r#"
implementations:
  - interface: {name: LUT, parameters: {num_inputs: 1}}
    modules:
      - module_name: BUF
        ports:
          - {name: A, value: I0, direction: input, bitwidth: 2}
          - {name: Z, value: Z, direction: output, bitwidth: 1}
    outputs: {O: Z}
"#;
        let err = load_architecture_from_str(yaml).unwrap_err();
        assert!(matches!(err, ArchError::WidthMismatch { .. }));
    }

    #[test]
    fn load_from_file_uses_stem_as_name() {
        let dir = std::env::temp_dir().join("tessera_loader_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("stem_fabric.yml");
        let unnamed = LUT4_YAML.replace("name: test_fabric\n", "");
        std::fs::write(&path, unnamed).unwrap();
        let arch = load_architecture(&path).unwrap();
        assert_eq!(arch.name, "stem_fabric");
    }

    #[test]
    fn io_error_on_missing_file() {
        let err = load_architecture(Path::new("/nonexistent/arch.yml")).unwrap_err();
        assert!(matches!(err, ArchError::Io(_)));
    }
}
