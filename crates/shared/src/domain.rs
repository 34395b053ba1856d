use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);
    };
}

id_newtype!(FileId);
id_newtype!(ReportId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Uploading,
    Pending,
    Analyzing,
    Completed,
    Failed,
}

impl FileStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Uploading => "Uploading",
            Self::Pending => "Pending",
            Self::Analyzing => "Analyzing",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Pending,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Pending => "Pending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Completed,
    Pending,
    InProgress,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 3] = [Self::Completed, Self::Pending, Self::InProgress];

    pub fn label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    RiskAssessment,
    Compliance,
    Financial,
    Audit,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        Self::RiskAssessment,
        Self::Compliance,
        Self::Financial,
        Self::Audit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::RiskAssessment => "Risk Assessment",
            Self::Compliance => "Compliance",
            Self::Financial => "Financial Analysis",
            Self::Audit => "Audit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEntry {
    pub title: String,
    pub description: String,
    pub severity: RiskLevel,
    pub detected_at: String,
}

/// Dashboard state persisted in the session store between view entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub risk_score: f64,
    pub risk_label: String,
    pub compliance_pct: f64,
    #[serde(default)]
    pub document_counts: Vec<CategoryCount>,
    #[serde(default)]
    pub anomalies: Vec<AnomalyEntry>,
    #[serde(default)]
    pub has_analysis: bool,
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self {
            risk_score: 0.0,
            risk_label: "No Data".to_string(),
            compliance_pct: 0.0,
            document_counts: Vec::new(),
            anomalies: Vec::new(),
            has_analysis: false,
        }
    }
}

impl DashboardSnapshot {
    pub fn total_documents(&self) -> u32 {
        self.document_counts.iter().map(|entry| entry.count).sum()
    }

    pub fn anomalies_with(&self, severity: RiskLevel) -> usize {
        self.anomalies
            .iter()
            .filter(|anomaly| anomaly.severity == severity)
            .count()
    }
}
