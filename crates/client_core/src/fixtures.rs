//! Fixed demonstration data shown by the analysis, dashboard and reports screens.

use chrono::NaiveDate;
use shared::domain::{
    AnomalyEntry, CategoryCount, DashboardSnapshot, ReportId, ReportKind, ReportStatus, RiskLevel,
};

use crate::charts::ChartSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskMetric {
    pub label: &'static str,
    pub value: &'static str,
    pub change: &'static str,
    pub trend: Trend,
    pub level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskFinding {
    pub category: &'static str,
    pub exposure: &'static str,
    pub probability: f64,
    pub impact: &'static str,
    pub level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub title: &'static str,
    pub detail: &'static str,
    pub confidence: f64,
    pub level: RiskLevel,
}

pub const RISK_METRICS: [RiskMetric; 4] = [
    RiskMetric {
        label: "Overall Risk Score",
        value: "72 / 100",
        change: "+4.2%",
        trend: Trend::Up,
        level: RiskLevel::Medium,
    },
    RiskMetric {
        label: "Credit Exposure",
        value: "$2.4M",
        change: "+12.8%",
        trend: Trend::Up,
        level: RiskLevel::High,
    },
    RiskMetric {
        label: "Liquidity Ratio",
        value: "1.8x",
        change: "-0.3x",
        trend: Trend::Down,
        level: RiskLevel::Medium,
    },
    RiskMetric {
        label: "Compliance Score",
        value: "87%",
        change: "0.0%",
        trend: Trend::Flat,
        level: RiskLevel::Low,
    },
];

pub const RISK_FINDINGS: [RiskFinding; 6] = [
    RiskFinding {
        category: "Credit Risk",
        exposure: "$1,240,000",
        probability: 0.34,
        impact: "Severe",
        level: RiskLevel::High,
    },
    RiskFinding {
        category: "Market Risk",
        exposure: "$860,000",
        probability: 0.22,
        impact: "Moderate",
        level: RiskLevel::Medium,
    },
    RiskFinding {
        category: "Liquidity Risk",
        exposure: "$410,000",
        probability: 0.18,
        impact: "Moderate",
        level: RiskLevel::Medium,
    },
    RiskFinding {
        category: "Operational Risk",
        exposure: "$295,000",
        probability: 0.12,
        impact: "Minor",
        level: RiskLevel::Low,
    },
    RiskFinding {
        category: "Counterparty Risk",
        exposure: "$720,000",
        probability: 0.27,
        impact: "Severe",
        level: RiskLevel::High,
    },
    RiskFinding {
        category: "Regulatory Risk",
        exposure: "$150,000",
        probability: 0.08,
        impact: "Minor",
        level: RiskLevel::Low,
    },
];

pub const INSIGHTS: [Insight; 3] = [
    Insight {
        title: "Concentrated credit exposure",
        detail: "Three counterparties account for 61% of outstanding receivables; consider exposure limits.",
        confidence: 0.92,
        level: RiskLevel::High,
    },
    Insight {
        title: "Tightening liquidity buffer",
        detail: "Current ratio fell for two consecutive quarters while short-term liabilities grew 18%.",
        confidence: 0.87,
        level: RiskLevel::Medium,
    },
    Insight {
        title: "Stable compliance posture",
        detail: "No new regulatory findings; documentation coverage is above the 85% target.",
        confidence: 0.95,
        level: RiskLevel::Low,
    },
];

pub fn risk_distribution_chart() -> ChartSpec {
    ChartSpec::bar("Risk distribution", &["High", "Medium", "Low"], 10.0)
        .with_series("Findings", &[2.0, 2.0, 2.0])
}

pub fn confidence_trend_chart() -> ChartSpec {
    ChartSpec::line("Model confidence", &["Q1", "Q2", "Q3", "Q4"], 100.0)
        .with_series("Confidence", &[78.0, 83.0, 88.0, 91.0])
}

pub fn compliance_history_chart() -> ChartSpec {
    ChartSpec::line(
        "Compliance by year",
        &["2019", "2020", "2021", "2022", "2023", "2024"],
        100.0,
    )
    .with_series("Compliance %", &[78.0, 81.0, 83.0, 85.0, 86.0, 87.5])
}

pub fn weekly_trend_chart() -> ChartSpec {
    ChartSpec::line(
        "Weekly risk trend",
        &["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
        100.0,
    )
    .with_series("Risk score", &[68.0, 70.0, 69.0, 73.0, 75.0, 72.0, 72.0])
}

pub fn demo_snapshot() -> DashboardSnapshot {
    DashboardSnapshot {
        risk_score: 72.0,
        risk_label: "Medium Risk".to_string(),
        compliance_pct: 87.5,
        document_counts: [
            ("Financial Statements", 14),
            ("Invoices", 38),
            ("Contracts", 9),
            ("Audit Reports", 5),
        ]
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect(),
        anomalies: vec![
            AnomalyEntry {
                title: "Duplicate vendor payment".to_string(),
                description: "Two payments of $48,200 to the same vendor within 3 days.".to_string(),
                severity: RiskLevel::High,
                detected_at: "2024-06-03".to_string(),
            },
            AnomalyEntry {
                title: "Unusual month-end accrual".to_string(),
                description: "Accruals 2.4x above the trailing six-month average.".to_string(),
                severity: RiskLevel::Medium,
                detected_at: "2024-05-31".to_string(),
            },
            AnomalyEntry {
                title: "Late covenant filing".to_string(),
                description: "Quarterly covenant certificate submitted 5 days late.".to_string(),
                severity: RiskLevel::Low,
                detected_at: "2024-05-20".to_string(),
            },
        ],
        has_analysis: true,
    }
}

pub struct SeedReport {
    pub id: i64,
    pub name: &'static str,
    pub kind: ReportKind,
    pub period: &'static str,
    pub risk_level: RiskLevel,
    pub generated_on: (i32, u32, u32),
    pub status: ReportStatus,
    pub file_ref: &'static str,
    pub size_label: &'static str,
}

pub const SEED_REPORTS: [SeedReport; 8] = [
    SeedReport {
        id: 1,
        name: "Q2 2024 Risk Assessment",
        kind: ReportKind::RiskAssessment,
        period: "Q2 2024",
        risk_level: RiskLevel::Medium,
        generated_on: (2024, 7, 2),
        status: ReportStatus::Completed,
        file_ref: "reports/q2-2024-risk-assessment.pdf",
        size_label: "2.4 MB",
    },
    SeedReport {
        id: 2,
        name: "Annual Compliance Review 2023",
        kind: ReportKind::Compliance,
        period: "FY 2023",
        risk_level: RiskLevel::Low,
        generated_on: (2024, 1, 15),
        status: ReportStatus::Completed,
        file_ref: "reports/annual-compliance-2023.pdf",
        size_label: "3.1 MB",
    },
    SeedReport {
        id: 3,
        name: "Liquidity Stress Test",
        kind: ReportKind::Financial,
        period: "June 2024",
        risk_level: RiskLevel::High,
        generated_on: (2024, 6, 28),
        status: ReportStatus::Completed,
        file_ref: "reports/liquidity-stress-test.pdf",
        size_label: "1.7 MB",
    },
    SeedReport {
        id: 4,
        name: "Vendor Payment Audit",
        kind: ReportKind::Audit,
        period: "H1 2024",
        risk_level: RiskLevel::Medium,
        generated_on: (2024, 7, 5),
        status: ReportStatus::Completed,
        file_ref: "reports/vendor-payment-audit.pdf",
        size_label: "980 KB",
    },
    SeedReport {
        id: 5,
        name: "Q3 2024 Risk Assessment",
        kind: ReportKind::RiskAssessment,
        period: "Q3 2024",
        risk_level: RiskLevel::Pending,
        generated_on: (2024, 10, 1),
        status: ReportStatus::Pending,
        file_ref: "reports/q3-2024-risk-assessment.pdf",
        size_label: "--",
    },
    SeedReport {
        id: 6,
        name: "Credit Portfolio Analysis",
        kind: ReportKind::Financial,
        period: "Q2 2024",
        risk_level: RiskLevel::High,
        generated_on: (2024, 6, 30),
        status: ReportStatus::Completed,
        file_ref: "reports/credit-portfolio-analysis.pdf",
        size_label: "4.2 MB",
    },
    SeedReport {
        id: 7,
        name: "AML Controls Review",
        kind: ReportKind::Compliance,
        period: "Q2 2024",
        risk_level: RiskLevel::Pending,
        generated_on: (2024, 7, 8),
        status: ReportStatus::InProgress,
        file_ref: "reports/aml-controls-review.pdf",
        size_label: "--",
    },
    SeedReport {
        id: 8,
        name: "Internal Controls Audit",
        kind: ReportKind::Audit,
        period: "FY 2023",
        risk_level: RiskLevel::Low,
        generated_on: (2024, 2, 20),
        status: ReportStatus::Completed,
        file_ref: "reports/internal-controls-audit.pdf",
        size_label: "1.3 MB",
    },
];

impl SeedReport {
    pub fn report_id(&self) -> ReportId {
        ReportId(self.id)
    }

    pub fn date(&self) -> NaiveDate {
        let (year, month, day) = self.generated_on;
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }
}
