//! Schema resolution: which struct types a primary type pulls in, and in
//! which order their signatures are concatenated.

use indexmap::IndexMap;

use crate::errors::SchemaError;
use crate::typed_data::Parameter;

/// Field type tags that encode directly to a field element.
pub(crate) const PRIMITIVE_TYPES: &[&str] = &[
    "felt",
    "bool",
    "string",
    "shortstring",
    "selector",
    "u128",
    "i128",
    "timestamp",
    "contractAddress",
    "merkletree",
];

pub(crate) fn is_pointer(type_name: &str) -> bool {
    type_name.ends_with('*')
}

pub(crate) fn strip_pointer(type_name: &str) -> &str {
    type_name.strip_suffix('*').unwrap_or(type_name)
}

/// All struct types reachable from `primary`: the primary itself first,
/// then every distinct dependency sorted lexicographically. This is the
/// order the type signature string concatenates them in.
///
/// Rejects unknown primary or field types, empty field lists and cyclic
/// struct references (a type reaching itself, directly or through
/// arrays).
pub(crate) fn dependencies(
    types: &IndexMap<String, Vec<Parameter>>,
    primary: &str,
) -> Result<Vec<String>, SchemaError> {
    if !types.contains_key(primary) {
        return Err(SchemaError::UnknownType(primary.to_string()));
    }
    let mut visiting = vec![primary.to_string()];
    let mut found = Vec::new();
    collect(types, primary, &mut visiting, &mut found)?;
    found.sort();
    let mut ordered = vec![primary.to_string()];
    ordered.extend(found);
    Ok(ordered)
}

fn collect(
    types: &IndexMap<String, Vec<Parameter>>,
    name: &str,
    visiting: &mut Vec<String>,
    found: &mut Vec<String>,
) -> Result<(), SchemaError> {
    let fields = types
        .get(name)
        .ok_or_else(|| SchemaError::UnknownType(name.to_string()))?;
    if fields.is_empty() {
        return Err(SchemaError::EmptyTypeDefinition(name.to_string()));
    }
    for field in fields {
        let target = strip_pointer(&field.r#type);
        if target == "merkletree" {
            // the leaf type hashes through its own type hash; it only
            // needs to exist, it does not join this signature string
            let leaf = field
                .contains
                .as_deref()
                .ok_or_else(|| SchemaError::MissingLeafType(field.name.clone()))?;
            if !types.contains_key(leaf) && !PRIMITIVE_TYPES.contains(&leaf) {
                return Err(SchemaError::UnknownType(leaf.to_string()));
            }
            continue;
        }
        if types.contains_key(target) {
            if visiting.iter().any(|t| t == target) {
                return Err(SchemaError::CyclicReference(target.to_string()));
            }
            if !found.iter().any(|t| t == target) {
                found.push(target.to_string());
                visiting.push(target.to_string());
                collect(types, target, visiting, found)?;
                visiting.pop();
            }
        } else if !PRIMITIVE_TYPES.contains(&target) {
            return Err(SchemaError::UnknownType(target.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn param(name: &str, r#type: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            r#type: r#type.to_string(),
            contains: None,
        }
    }

    fn mail_types() -> IndexMap<String, Vec<Parameter>> {
        let mut types = IndexMap::new();
        types.insert(
            "Mail".to_string(),
            vec![
                param("from", "Person"),
                param("to", "Person"),
                param("contents", "felt"),
            ],
        );
        types.insert(
            "Person".to_string(),
            vec![param("name", "felt"), param("wallet", "felt")],
        );
        types
    }

    #[test]
    fn test_dependencies_primary_first_then_sorted() {
        let mut types = mail_types();
        types.insert(
            "Aardvark".to_string(),
            vec![param("noise", "felt")],
        );
        types
            .get_mut("Mail")
            .unwrap()
            .push(param("pet", "Aardvark"));
        assert_eq!(
            dependencies(&types, "Mail").unwrap(),
            vec!["Mail", "Aardvark", "Person"]
        );
    }

    #[test]
    fn test_unknown_primary() {
        assert_eq!(
            dependencies(&mail_types(), "Missive").unwrap_err(),
            SchemaError::UnknownType("Missive".to_string())
        );
    }

    #[test]
    fn test_unknown_field_type() {
        let mut types = mail_types();
        types
            .get_mut("Person")
            .unwrap()
            .push(param("employer", "Company"));
        assert_eq!(
            dependencies(&types, "Mail").unwrap_err(),
            SchemaError::UnknownType("Company".to_string())
        );
    }

    #[test]
    fn test_empty_type_definition() {
        let mut types = mail_types();
        types.insert("Empty".to_string(), vec![]);
        types.get_mut("Mail").unwrap().push(param("extra", "Empty"));
        assert_eq!(
            dependencies(&types, "Mail").unwrap_err(),
            SchemaError::EmptyTypeDefinition("Empty".to_string())
        );
    }

    #[test]
    fn test_direct_self_reference() {
        let mut types = IndexMap::new();
        types.insert(
            "Node".to_string(),
            vec![param("value", "felt"), param("next", "Node")],
        );
        assert_eq!(
            dependencies(&types, "Node").unwrap_err(),
            SchemaError::CyclicReference("Node".to_string())
        );
    }

    #[test]
    fn test_self_reference_through_array() {
        let mut types = IndexMap::new();
        types.insert(
            "Tree".to_string(),
            vec![param("value", "felt"), param("children", "Tree*")],
        );
        assert_eq!(
            dependencies(&types, "Tree").unwrap_err(),
            SchemaError::CyclicReference("Tree".to_string())
        );
    }

    #[test]
    fn test_indirect_cycle() {
        let mut types = IndexMap::new();
        types.insert("A".to_string(), vec![param("b", "B")]);
        types.insert("B".to_string(), vec![param("a", "A")]);
        assert_eq!(
            dependencies(&types, "A").unwrap_err(),
            SchemaError::CyclicReference("A".to_string())
        );
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        // two fields referencing the same type is fine
        let mut types = mail_types();
        types.insert(
            "Envelope".to_string(),
            vec![param("mail", "Mail"), param("copy", "Mail")],
        );
        assert_eq!(
            dependencies(&types, "Envelope").unwrap(),
            vec!["Envelope", "Mail", "Person"]
        );
    }

    #[test]
    fn test_merkletree_requires_contains() {
        let mut types = IndexMap::new();
        types.insert(
            "Session".to_string(),
            vec![param("root", "merkletree")],
        );
        assert_eq!(
            dependencies(&types, "Session").unwrap_err(),
            SchemaError::MissingLeafType("root".to_string())
        );
    }

    #[test]
    fn test_merkletree_leaf_stays_out_of_signature() {
        let mut types = IndexMap::new();
        let mut root = param("root", "merkletree");
        root.contains = Some("Policy".to_string());
        types.insert(
            "Session".to_string(),
            vec![param("key", "felt"), root],
        );
        types.insert(
            "Policy".to_string(),
            vec![param("contractAddress", "contractAddress")],
        );
        assert_eq!(dependencies(&types, "Session").unwrap(), vec!["Session"]);
    }
}
