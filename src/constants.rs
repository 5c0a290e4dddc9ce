/// Column names shared by the schema presets, the aggregate rules and the anomaly probe.
/// These match the header row of the DataCo Smart Supply CSV exports.

// Supply-chain grouping keys
pub const ORDER_ID: &str = "Order Id";
pub const CUSTOMER_ID: &str = "Customer Id";

// Supply-chain line-item values feeding the derived aggregates
pub const ORDER_PROFIT_PER_ORDER: &str = "Order Profit Per Order";
pub const SALES: &str = "Sales";
pub const ORDER_ITEM_QUANTITY: &str = "Order Item Quantity";

// Derived columns recomputed by the pipeline
pub const BENEFIT_PER_ORDER: &str = "Benefit per order";
pub const SALES_PER_CUSTOMER: &str = "Sales per customer";

// Date columns
pub const ORDER_DATE: &str = "order date (DateOrders)";
pub const SHIPPING_DATE: &str = "shipping date (DateOrders)";
pub const ACCESS_LOG_DATE: &str = "Date";
pub const ACCESS_LOG_HOUR: &str = "Hour";

/// Remaining numeric columns of the supply-chain export.
pub const SUPPLY_CHAIN_NUMERIC: &[&str] = &[
    BENEFIT_PER_ORDER,
    SALES_PER_CUSTOMER,
    "Days for shipping (real)",
    "Days for shipment (scheduled)",
    "Order Item Discount",
    "Order Item Discount Rate",
    "Order Item Product Price",
    "Order Item Profit Ratio",
    ORDER_ITEM_QUANTITY,
    SALES,
    "Order Item Total",
    ORDER_PROFIT_PER_ORDER,
    "Product Price",
];

// Default on-disk layout
pub const DEFAULT_DATA_ROOT: &str = "datasets/DataCo_Smart_Supply";
pub const DEFAULT_OUTPUT_DIR: &str = "data";
pub const ACCESS_LOGS_FILE: &str = "tokenized_access_logs.csv";
pub const SUPPLY_CHAIN_FILE: &str = "DataCoSupplyChainDataset.csv";
pub const TRANSFORMED_SUFFIX: &str = "_transformed";
pub const REPORT_SUFFIX: &str = "_report";

/// Day/month/year, used whenever a normalized date is written back out as text.
pub const DEFAULT_OUTPUT_DATE_FORMAT: &str = "%d/%m/%Y";

// Environment variables
pub const CONFIG_ENV: &str = "RECONCILE_CONFIG";
pub const DATA_ROOT_ENV: &str = "RECONCILE_DATA_ROOT";
