//! JSON schema definitions for report validation.

/// JSON Schema for deployment-report.json.
pub const REPORT_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "Scenario Deployment Analysis Report",
  "type": "object",
  "required": ["scenario", "report_version", "generated_at", "dependencies", "aggregates", "bundle_manifest", "metadata_gaps"],
  "properties": {
    "scenario": { "type": "string", "minLength": 1 },
    "report_version": { "type": "integer", "minimum": 1 },
    "generated_at": { "type": "string", "format": "date-time" },
    "dependencies": {
      "type": "array",
      "items": { "$ref": "#/definitions/node" }
    },
    "aggregates": {
      "type": "object",
      "additionalProperties": {
        "type": "object",
        "required": ["dependency_count", "fitness_score", "blocking_dependencies"],
        "properties": {
          "dependency_count": { "type": "integer", "minimum": 0 },
          "fitness_score": { "type": "number", "minimum": 0, "maximum": 1 },
          "blocking_dependencies": { "type": "array", "items": { "type": "string" }, "uniqueItems": true }
        }
      }
    },
    "bundle_manifest": {
      "type": "object",
      "required": ["scenario", "generated_at", "files", "dependencies", "skeleton"],
      "properties": {
        "scenario": { "type": "string" },
        "files": {
          "type": "array",
          "items": {
            "type": "object",
            "required": ["path", "type", "exists"],
            "properties": {
              "path": { "type": "string" },
              "type": { "type": "string" },
              "exists": { "type": "boolean" }
            }
          }
        },
        "dependencies": {
          "type": "array",
          "items": {
            "type": "object",
            "required": ["name", "type"],
            "properties": {
              "name": { "type": "string" },
              "type": { "enum": ["resource", "scenario"] },
              "tier_support": { "type": "object", "additionalProperties": { "$ref": "#/definitions/tier_support" } },
              "alternatives": { "type": "array", "items": { "type": "string" } }
            }
          }
        },
        "skeleton": {
          "type": "object",
          "required": ["schema_version", "target", "app", "ipc", "telemetry", "ports", "swaps", "services"],
          "properties": {
            "schema_version": { "type": "string" },
            "target": { "const": "desktop" },
            "app": {
              "type": "object",
              "required": ["name", "version"],
              "properties": {
                "name": { "type": "string" },
                "version": { "type": "string" }
              }
            },
            "swaps": {
              "type": "array",
              "items": {
                "type": "object",
                "required": ["original", "replacement", "reason"]
              }
            },
            "services": {
              "type": "array",
              "items": {
                "type": "object",
                "required": ["id", "type", "ports", "health", "readiness", "critical"]
              }
            }
          }
        }
      }
    },
    "metadata_gaps": {
      "type": "object",
      "required": ["total_gaps", "scenarios_missing_all", "gaps_by_scenario", "missing_tiers", "secret_requirements", "resource_swap_suggestions", "recommendations"],
      "properties": {
        "total_gaps": { "type": "integer", "minimum": 0 },
        "scenarios_missing_all": { "type": "integer", "minimum": 0 },
        "gaps_by_scenario": { "type": "object" },
        "missing_tiers": { "type": "array", "items": { "type": "string" }, "uniqueItems": true },
        "secret_requirements": {
          "type": "array",
          "items": {
            "type": "object",
            "required": ["dependency_name", "secret_type", "required_secrets", "priority"]
          }
        },
        "resource_swap_suggestions": {
          "type": "array",
          "items": {
            "type": "object",
            "required": ["original_resource", "alternative_resource", "applicable_tiers"]
          }
        },
        "recommendations": { "type": "array", "items": { "type": "string" } }
      }
    }
  },
  "definitions": {
    "tier_support": {
      "type": "object",
      "required": ["supported", "source"],
      "properties": {
        "supported": { "type": ["boolean", "null"] },
        "fitness_score": { "type": "number", "minimum": 0, "maximum": 1 },
        "reason": { "type": "string" },
        "notes": { "type": "string" },
        "alternatives": { "type": "array", "items": { "type": "string" } },
        "source": { "enum": ["declared", "tier_status", "inferred"] }
      }
    },
    "node": {
      "type": "object",
      "required": ["name", "type", "source", "tier_support", "alternatives", "children"],
      "properties": {
        "name": { "type": "string", "minLength": 1 },
        "type": { "enum": ["resource", "scenario"] },
        "resource_type": { "type": "string" },
        "path": { "type": "string" },
        "source": { "type": "string" },
        "notes": { "type": "string" },
        "tier_support": { "type": "object", "additionalProperties": { "$ref": "#/definitions/tier_support" } },
        "alternatives": { "type": "array", "items": { "type": "string" }, "uniqueItems": true },
        "children": { "type": "array", "items": { "$ref": "#/definitions/node" } }
      }
    }
  }
}"##;

/// Get the report schema as a parsed JSON value.
pub fn report_schema() -> serde_json::Value {
    serde_json::from_str(REPORT_SCHEMA).expect("Invalid report schema")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_schema_parses() {
        let schema = report_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["definitions"]["node"].is_object());
    }
}
