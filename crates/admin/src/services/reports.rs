//! Reports dashboard data and CSV export.
//!
//! The figures are fixed sample data; there is no reporting backend yet.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// One of the four report tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportTab {
    Sales,
    Users,
    Inventory,
    Orders,
}

/// A tab name that matches no report.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown report '{0}' (expected sales, user, inventory or order)")]
pub struct UnknownReport(pub String);

impl ReportTab {
    /// Tabs in display order.
    pub const ALL: [Self; 4] = [Self::Sales, Self::Users, Self::Inventory, Self::Orders];

    /// URL key for the tab.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Users => "user",
            Self::Inventory => "inventory",
            Self::Orders => "order",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sales => "Sales Report",
            Self::Users => "User Report",
            Self::Inventory => "Inventory Report",
            Self::Orders => "Order Report",
        }
    }

    /// Download file name, e.g. `sales_report.csv`.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}_report.csv", self.key())
    }
}

impl fmt::Display for ReportTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ReportTab {
    type Err = UnknownReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sales" => Ok(Self::Sales),
            "user" | "users" => Ok(Self::Users),
            "inventory" => Ok(Self::Inventory),
            "order" | "orders" => Ok(Self::Orders),
            _ => Err(UnknownReport(s.to_string())),
        }
    }
}

/// A report as a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub tab: ReportTab,
    /// Record field names, used as the CSV header.
    pub fields: &'static [&'static str],
    /// Column headings for the on-screen table.
    pub headings: &'static [&'static str],
    /// Index into `fields` of each on-screen column.
    pub shown: &'static [usize],
    pub rows: Vec<Vec<String>>,
}

impl Report {
    /// Rows restricted to the on-screen columns.
    #[must_use]
    pub fn table_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                self.shown
                    .iter()
                    .filter_map(|&i| row.get(i).cloned())
                    .collect()
            })
            .collect()
    }

    /// Render as CSV: a header row of field names, then every value
    /// double-quoted. Lines are joined with `\n`.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.fields.join(","));
        lines.extend(self.rows.iter().map(|row| {
            row.iter()
                .map(|value| format!("\"{}\"", value.replace('"', "\"\"")))
                .collect::<Vec<_>>()
                .join(",")
        }));
        lines.join("\n")
    }
}

struct SalesDay {
    id: u32,
    date: &'static str,
    total: u32,
    orders: u32,
}

struct UserRow {
    id: u32,
    name: &'static str,
    joined: &'static str,
    orders: u32,
}

struct StockRow {
    id: u32,
    product: &'static str,
    stock: u32,
}

struct OrderRow {
    id: u32,
    user: &'static str,
    date: &'static str,
    amount: u32,
}

const SALES: [SalesDay; 3] = [
    SalesDay { id: 1, date: "2024-06-01", total: 1200, orders: 15 },
    SalesDay { id: 2, date: "2024-06-02", total: 950, orders: 10 },
    SalesDay { id: 3, date: "2024-06-03", total: 1800, orders: 20 },
];

const USERS: [UserRow; 3] = [
    UserRow { id: 1, name: "Amit", joined: "2024-05-10", orders: 5 },
    UserRow { id: 2, name: "Priya", joined: "2024-05-12", orders: 2 },
    UserRow { id: 3, name: "Rahul", joined: "2024-05-15", orders: 7 },
];

const STOCK: [StockRow; 3] = [
    StockRow { id: 1, product: "T-shirt", stock: 120 },
    StockRow { id: 2, product: "Jeans", stock: 80 },
    StockRow { id: 3, product: "Shoes", stock: 45 },
];

const ORDERS: [OrderRow; 3] = [
    OrderRow { id: 101, user: "Amit", date: "2024-06-01", amount: 500 },
    OrderRow { id: 102, user: "Priya", date: "2024-06-02", amount: 300 },
    OrderRow { id: 103, user: "Rahul", date: "2024-06-03", amount: 700 },
];

/// Build the report for a tab.
#[must_use]
pub fn report(tab: ReportTab) -> Report {
    match tab {
        ReportTab::Sales => Report {
            tab,
            fields: &["id", "date", "total", "orders"],
            headings: &["Date", "Total Sales (₹)", "Orders"],
            shown: &[1, 2, 3],
            rows: SALES
                .iter()
                .map(|r| vec![r.id.to_string(), r.date.to_string(), r.total.to_string(), r.orders.to_string()])
                .collect(),
        },
        ReportTab::Users => Report {
            tab,
            fields: &["id", "name", "joined", "orders"],
            headings: &["Name", "Joined", "Orders"],
            shown: &[1, 2, 3],
            rows: USERS
                .iter()
                .map(|r| vec![r.id.to_string(), r.name.to_string(), r.joined.to_string(), r.orders.to_string()])
                .collect(),
        },
        ReportTab::Inventory => Report {
            tab,
            fields: &["id", "product", "stock"],
            headings: &["Product", "Stock"],
            shown: &[1, 2],
            rows: STOCK
                .iter()
                .map(|r| vec![r.id.to_string(), r.product.to_string(), r.stock.to_string()])
                .collect(),
        },
        ReportTab::Orders => Report {
            tab,
            fields: &["id", "user", "date", "amount"],
            headings: &["Order ID", "User", "Date", "Amount (₹)"],
            shown: &[0, 1, 2, 3],
            rows: ORDERS
                .iter()
                .map(|r| vec![r.id.to_string(), r.user.to_string(), r.date.to_string(), r.amount.to_string()])
                .collect(),
        },
    }
}
