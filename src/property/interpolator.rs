//! `${name}` placeholder resolution across a module chain

use indexmap::IndexMap;
use thiserror::Error;

use crate::model::Module;

/// Prefixes addressing the originating module itself; `pom.` is the legacy alias.
const MODULE_PREFIXES: [&str; 2] = ["project.", "pom."];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterpolationError {
    #[error("Cyclic property reference detected while resolving '${{{name}}}'")]
    Cycle { name: String },

    #[error("Unterminated placeholder in '{expression}'")]
    Unterminated { expression: String },
}

/// Resolves placeholders against one amalgamated property table.
///
/// The table is built from a chain ordered least to most specific: each
/// module's own properties, then its active profiles, later entries winning.
pub struct PropertyInterpolator<'a> {
    properties: IndexMap<&'a str, &'a str>,
    origin: Option<&'a Module>,
    parent: Option<&'a Module>,
}

impl<'a> PropertyInterpolator<'a> {
    pub fn new(chain: &[&'a Module]) -> Self {
        let mut properties = IndexMap::new();
        for module in chain.iter().copied() {
            let tables = std::iter::once(&module.properties)
                .chain(module.active_profiles().map(|p| &p.properties));
            for table in tables {
                properties.extend(table.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            }
        }

        let parent = match chain {
            [.., parent, _] => Some(*parent),
            _ => None,
        };

        Self {
            properties,
            origin: chain.last().copied(),
            parent,
        }
    }

    pub fn properties(&self) -> &IndexMap<&'a str, &'a str> {
        &self.properties
    }

    /// Substitute every resolvable placeholder in `value`.
    ///
    /// Placeholders naming nothing known are kept verbatim.
    pub fn interpolate(&self, value: &str) -> Result<String, InterpolationError> {
        let mut visiting = Vec::new();
        self.interpolate_with(value, &mut visiting)
    }

    fn interpolate_with(
        &self,
        value: &str,
        visiting: &mut Vec<String>,
    ) -> Result<String, InterpolationError> {
        let mut result = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let body = &rest[start + 2..];
            let end = body.find('}').ok_or_else(|| InterpolationError::Unterminated {
                expression: value.to_string(),
            })?;
            let name = &body[..end];

            match self.lookup(name) {
                Some(raw) => {
                    if visiting.iter().any(|v| v == name) {
                        return Err(InterpolationError::Cycle {
                            name: name.to_string(),
                        });
                    }
                    visiting.push(name.to_string());
                    let resolved = self.interpolate_with(raw, visiting)?;
                    visiting.pop();
                    result.push_str(&resolved);
                }
                None => result.push_str(&rest[start..start + 2 + end + 1]),
            }

            rest = &body[end + 1..];
        }

        result.push_str(rest);
        Ok(result)
    }

    fn lookup(&self, name: &str) -> Option<&'a str> {
        if let Some(field) = MODULE_PREFIXES
            .iter()
            .find_map(|prefix| name.strip_prefix(prefix))
        {
            if let Some(value) = self.module_field(field) {
                return Some(value);
            }
        }
        self.properties.get(name).copied()
    }

    fn module_field(&self, field: &str) -> Option<&'a str> {
        let (module, field) = match field.strip_prefix("parent.") {
            Some(field) => (self.parent?, field),
            None => (self.origin?, field),
        };
        match field {
            "version" => Some(module.version.as_str()),
            "groupId" => Some(module.group_id.as_str()),
            "artifactId" => Some(module.artifact_id.as_str()),
            _ => None,
        }
    }
}

/// Resolve `value` against `chain` (least specific module first).
pub fn resolve(value: &str, chain: &[&Module]) -> Result<String, InterpolationError> {
    PropertyInterpolator::new(chain).interpolate(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Profile;
    use rstest::rstest;

    fn profile(id: &str, active: bool, key: &str, value: &str) -> Profile {
        let mut profile = Profile::new(id, active);
        profile.properties.insert(key.to_string(), value.to_string());
        profile
    }

    #[rstest]
    #[case("${foo}", "1.0")]
    #[case("v${foo}-x", "v1.0-x")]
    #[case("${bar}", "1.0.Final")]
    #[case("${foo}/${baz}", "1.0/${baz}")]
    #[case("literal", "literal")]
    #[case("${project.version}", "2.0")]
    #[case("${pom.artifactId}", "child")]
    #[case("${project.parent.artifactId}", "root")]
    fn resolve_returns_expected(#[case] input: &str, #[case] expected: &str) {
        let root = Module::new("org.foo", "root", "1.0")
            .with_property("foo", "0.9")
            .with_property("bar", "${foo}.Final");
        let child = Module::new("org.foo", "child", "2.0").with_property("foo", "1.0");

        assert_eq!(resolve(input, &[&root, &child]).unwrap(), expected);
    }

    #[test]
    fn active_profile_overrides_own_table() {
        let module = Module::new("org.foo", "app", "1.0")
            .with_property("foo", "1.0")
            .with_profile(profile("on", true, "foo", "2.0"))
            .with_profile(profile("off", false, "foo", "3.0"));

        assert_eq!(resolve("${foo}", &[&module]).unwrap(), "2.0");
    }

    #[test]
    fn more_specific_module_wins_over_ancestor_profile() {
        let root = Module::new("org.foo", "root", "1.0")
            .with_profile(profile("on", true, "foo", "root-profile"));
        let child = Module::new("org.foo", "child", "1.0").with_property("foo", "child");

        assert_eq!(resolve("${foo}", &[&root, &child]).unwrap(), "child");
    }

    #[test]
    fn resolve_detects_cycles() {
        let module = Module::new("org.foo", "app", "1.0")
            .with_property("a", "${b}")
            .with_property("b", "x-${a}");

        assert!(matches!(
            resolve("${a}", &[&module]),
            Err(InterpolationError::Cycle { .. })
        ));
    }

    #[test]
    fn resolve_allows_repeated_non_cyclic_references() {
        let module = Module::new("org.foo", "app", "1.0")
            .with_property("a", "1")
            .with_property("b", "${a}.${a}");

        assert_eq!(resolve("${b}-${a}", &[&module]).unwrap(), "1.1-1");
    }

    #[test]
    fn resolve_rejects_unterminated_placeholder() {
        let module = Module::new("org.foo", "app", "1.0");

        assert_eq!(
            resolve("${foo", &[&module]),
            Err(InterpolationError::Unterminated {
                expression: "${foo".to_string()
            })
        );
    }
}
