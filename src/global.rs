//! Account-wide (non-regional) findings: inactive IAM users and empty S3 buckets

use crate::api::ApiClient;
use crate::error::{Result, RmonError};
use crate::resources::region::RegionContext;
use chrono::DateTime;
use comfy_table::Table;
use console::style;
use serde::{Deserialize, Serialize};

pub const GLOBAL_ONLY: &str = "Global resources are only supported for Global region selection.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamUser {
    pub user_name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub last_login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Bucket {
    pub bucket_name: String,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl S3Bucket {
    /// Creation date without the time part, or the raw value if unparsable
    pub fn created_on(&self) -> String {
        match self.creation_date.as_deref() {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|_| raw.to_string()),
            None => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlobalResources {
    pub iam_users: Vec<IamUser>,
    pub s3_buckets: Vec<S3Bucket>,
}

/// Global findings only make sense for the `Global` context
pub fn ensure_global(region: &RegionContext) -> Result<()> {
    if region.is_global() {
        Ok(())
    } else {
        Err(RmonError::validation("region", GLOBAL_ONLY))
    }
}

/// Fetch both lists concurrently
pub async fn fetch_global(client: &ApiClient, region: &RegionContext) -> Result<GlobalResources> {
    ensure_global(region)?;
    let (iam_users, s3_buckets) = futures::try_join!(client.iam_users(), client.s3_buckets())?;
    Ok(GlobalResources {
        iam_users,
        s3_buckets,
    })
}

impl GlobalResources {
    pub fn print(&self) {
        println!("{}", style("Inactive IAM Users").bold().cyan());
        if self.iam_users.is_empty() {
            println!("No IAM users found.");
        } else {
            let mut table = Table::new();
            table.set_header(vec!["User", "ID", "Last Login"]);
            for user in &self.iam_users {
                table.add_row(vec![
                    user.user_name.as_str(),
                    user.user_id.as_str(),
                    user.last_login.as_deref().unwrap_or("never"),
                ]);
            }
            println!("{}", table);
        }

        println!();
        println!("{}", style("Empty S3 Buckets").bold().cyan());
        if self.s3_buckets.is_empty() {
            println!("No S3 buckets found.");
        } else {
            let mut table = Table::new();
            table.set_header(vec!["Bucket", "Created", "Status"]);
            for bucket in &self.s3_buckets {
                table.add_row(vec![
                    bucket.bucket_name.clone(),
                    bucket.created_on(),
                    bucket.status.clone().unwrap_or_else(|| "-".to_string()),
                ]);
            }
            println!("{}", table);
        }
    }
}
