//! Dashboard aggregates.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::display::{format_compact_usd, StatCard};
use crate::error::CrmResult;
use crate::models::{
    AgentData, LeadData, LeadStatus, MessageData, MessageStatus, PropertyData, PropertyStatus,
};
use crate::storage::Store;

const PERIOD_DAYS: i64 = 30;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_leads: usize,
    /// Leads created in the last 30 days.
    pub new_leads: usize,
    /// Change of `new_leads` against the 30 days before, in percent.
    pub new_leads_change: Option<f64>,
    pub active_listings: usize,
    /// Sum of asking prices of listings still on the market.
    pub pipeline_value: f64,
    pub active_agents: usize,
    pub total_revenue: f64,
    pub conversion_rate: f64,
    pub undelivered_messages: usize,
}

/// Percentage change from `previous` to `current`; undefined when there is
/// nothing to compare against.
pub fn percent_change(current: usize, previous: usize) -> Option<f64> {
    if previous == 0 {
        return None;
    }
    Some((current as f64 - previous as f64) / previous as f64 * 100.0)
}

impl DashboardStats {
    pub fn compute(store: &Store, now: DateTime<Utc>) -> CrmResult<Self> {
        let leads = store.all::<LeadData>()?;
        let properties = store.all::<PropertyData>()?;
        let agents = store.all::<AgentData>()?;
        let messages = store.all::<MessageData>()?;

        let period_start = now - Duration::days(PERIOD_DAYS);
        let previous_start = period_start - Duration::days(PERIOD_DAYS);
        let new_leads = leads.iter().filter(|l| l.created_at >= period_start).count();
        let previous_leads = leads
            .iter()
            .filter(|l| l.created_at >= previous_start && l.created_at < period_start)
            .count();

        let listed: Vec<_> = properties
            .iter()
            .filter(|p| {
                matches!(
                    p.data.status,
                    PropertyStatus::Available | PropertyStatus::Active | PropertyStatus::Pending
                )
            })
            .collect();

        let closed = leads.iter().filter(|l| l.data.status == LeadStatus::Closed).count();
        let conversion_rate = if leads.is_empty() {
            0.0
        } else {
            closed as f64 / leads.len() as f64 * 100.0
        };

        Ok(Self {
            total_leads: leads.len(),
            new_leads,
            new_leads_change: percent_change(new_leads, previous_leads),
            active_listings: listed.len(),
            pipeline_value: listed.iter().map(|p| p.data.price).sum(),
            active_agents: agents.iter().filter(|a| a.data.is_active).count(),
            total_revenue: agents.iter().filter_map(|a| a.data.total_revenue).sum(),
            conversion_rate,
            undelivered_messages: messages
                .iter()
                .filter(|m| matches!(m.data.status, MessageStatus::Pending | MessageStatus::Failed))
                .count(),
        })
    }

    pub fn cards(&self) -> Vec<StatCard> {
        vec![
            StatCard::new("Total Leads", self.total_leads.to_string()),
            StatCard::new("New Leads (30d)", self.new_leads.to_string())
                .with_change(self.new_leads_change),
            StatCard::new("Active Listings", self.active_listings.to_string()),
            StatCard::new("Pipeline Value", format_compact_usd(Some(self.pipeline_value))),
            StatCard::new("Active Agents", self.active_agents.to_string()),
            StatCard::new("Conversion Rate", format!("{:.1}%", self.conversion_rate)),
        ]
    }
}
