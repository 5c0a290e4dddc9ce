use serde::{Deserialize, Serialize};

use crate::constants::{
    ACCESS_LOG_DATE, ACCESS_LOG_HOUR, BENEFIT_PER_ORDER, CUSTOMER_ID, ORDER_DATE, ORDER_ID,
    ORDER_ITEM_QUANTITY, ORDER_PROFIT_PER_ORDER, SALES, SALES_PER_CUSTOMER, SHIPPING_DATE,
    SUPPLY_CHAIN_NUMERIC,
};

/// Built-in schemas selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPreset {
    AccessLogs,
    SupplyChain,
    /// Nothing declared; the dataset passes through untouched
    Plain,
}

/// Group-and-broadcast rule: sum `source` per `key` and write it to `target` on every row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRule {
    pub key: String,
    pub source: String,
    pub target: String,
}

impl AggregateRule {
    pub fn new(key: &str, source: &str, target: &str) -> Self {
        Self {
            key: key.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// Where to look for the extreme minimum and what to show about the offending group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyProbe {
    pub key: String,
    pub value: String,
    pub projection: Vec<String>,
}

/// Per-dataset column declarations. Consulted by the stages, never mutated by them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub name: String,
    pub date_columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub aggregates: Vec<AggregateRule>,
    pub anomaly_probe: Option<AnomalyProbe>,
}

impl Schema {
    pub fn from_preset(preset: SchemaPreset) -> Self {
        match preset {
            SchemaPreset::AccessLogs => Self::access_logs(),
            SchemaPreset::SupplyChain => Self::supply_chain(),
            SchemaPreset::Plain => Self::plain("plain"),
        }
    }

    pub fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            date_columns: Vec::new(),
            numeric_columns: Vec::new(),
            aggregates: Vec::new(),
            anomaly_probe: None,
        }
    }

    /// Tokenized web access logs: one date column, hour of access as a number
    pub fn access_logs() -> Self {
        Self {
            date_columns: vec![ACCESS_LOG_DATE.to_string()],
            numeric_columns: vec![ACCESS_LOG_HOUR.to_string()],
            ..Self::plain("access_logs")
        }
    }

    /// Order line items with the two recomputed aggregates and the profitability probe
    pub fn supply_chain() -> Self {
        Self {
            name: "supply_chain".to_string(),
            date_columns: vec![ORDER_DATE.to_string(), SHIPPING_DATE.to_string()],
            numeric_columns: SUPPLY_CHAIN_NUMERIC.iter().map(|c| c.to_string()).collect(),
            aggregates: vec![
                AggregateRule::new(ORDER_ID, ORDER_PROFIT_PER_ORDER, BENEFIT_PER_ORDER),
                AggregateRule::new(CUSTOMER_ID, SALES, SALES_PER_CUSTOMER),
            ],
            anomaly_probe: Some(AnomalyProbe {
                key: ORDER_ID.to_string(),
                value: BENEFIT_PER_ORDER.to_string(),
                projection: [
                    ORDER_ID,
                    ORDER_ITEM_QUANTITY,
                    ORDER_PROFIT_PER_ORDER,
                    BENEFIT_PER_ORDER,
                ]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            }),
        }
    }

    pub fn with_date_columns(mut self, columns: Vec<String>) -> Self {
        self.date_columns = columns;
        self
    }

    pub fn with_numeric_columns(mut self, columns: Vec<String>) -> Self {
        self.numeric_columns = columns;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_chain_declares_both_aggregates() {
        let schema = Schema::supply_chain();
        let targets: Vec<&str> = schema.aggregates.iter().map(|a| a.target.as_str()).collect();
        assert_eq!(targets, vec![BENEFIT_PER_ORDER, SALES_PER_CUSTOMER]);
        assert!(schema.date_columns.iter().any(|c| c == SHIPPING_DATE));
        assert!(schema.numeric_columns.iter().any(|c| c == SALES));
        assert!(!schema.numeric_columns.iter().any(|c| c == ORDER_ID));
    }

    #[test]
    fn test_access_logs_has_no_probe() {
        let schema = Schema::from_preset(SchemaPreset::AccessLogs);
        assert!(schema.anomaly_probe.is_none());
        assert!(schema.aggregates.is_empty());
        assert_eq!(schema.date_columns, vec!["Date".to_string()]);
    }

    #[test]
    fn test_overrides_replace_declared_columns() {
        let schema = Schema::access_logs().with_date_columns(vec!["When".to_string()]);
        assert_eq!(schema.date_columns, vec!["When".to_string()]);
        assert_eq!(schema.numeric_columns, vec!["Hour".to_string()]);
    }
}
