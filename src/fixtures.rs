//! Seed data for the mock backend.
//!
//! Five messages and three knowledge items for `auditor-1`, plus one
//! knowledge item for `auditor-2`.

use chrono::{DateTime, Utc};

use crate::models::{
    KnowledgeContent, KnowledgeItem, KnowledgeItemType, Message, MessageHistoryItem, MessageStatus,
};

/// Auditor that owns the seeded records
pub const DEFAULT_AUDITOR_ID: &str = "auditor-1";

fn stamp(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn message(
    id: &str, customer_id: &str, question: &str, response: &str, confidence: f64, status: MessageStatus,
    created_at: &str, updated_at: &str,
) -> Message {
    Message {
        id: id.to_string(),
        customer_id: customer_id.to_string(),
        auditor_id: DEFAULT_AUDITOR_ID.to_string(),
        question: question.to_string(),
        response: response.to_string(),
        confidence,
        status,
        created_at: stamp(created_at),
        updated_at: stamp(updated_at),
        history: Vec::new(),
    }
}

/// Messages awaiting or past review
#[must_use]
pub fn seed_messages() -> Vec<Message> {
    let mut roth = message(
        "2",
        "customer-2",
        "Should I convert my traditional IRA to a Roth IRA this year?",
        "Converting to a Roth IRA means paying taxes now for tax-free withdrawals later. This could be beneficial if \
         you expect to be in a higher tax bracket during retirement or if tax rates increase. Consider your current \
         income, expected retirement income, and available funds to pay the conversion tax.",
        0.78,
        MessageStatus::Approved,
        "2025-04-23T14:15:00Z",
        "2025-04-24T10:45:00Z",
    );
    roth.history.push(MessageHistoryItem {
        id: "101".to_string(),
        message_id: "2".to_string(),
        response: "Converting from a traditional IRA to a Roth IRA could be beneficial depending on your tax situation."
            .to_string(),
        confidence: 0.65,
        created_at: stamp("2025-04-23T14:15:00Z"),
    });

    vec![
        message(
            "1",
            "customer-1",
            "What are the tax implications of selling my rental property?",
            "When selling a rental property, you'll need to consider capital gains tax, depreciation recapture, and \
             potential 1031 exchange options. The specific tax implications depend on how long you've owned the \
             property and your overall tax situation.",
            0.92,
            MessageStatus::Pending,
            "2025-04-24T09:30:00Z",
            "2025-04-24T09:30:00Z",
        ),
        roth,
        message(
            "3",
            "customer-3",
            "How should I allocate my 401(k) investments?",
            "Your 401(k) allocation should be based on your age, risk tolerance, and retirement timeline. A common \
             guideline is to subtract your age from 110 to determine your stock percentage, with the remainder in \
             bonds. Consider diversifying across different asset classes and regularly rebalancing your portfolio.",
            0.88,
            MessageStatus::Later,
            "2025-04-22T11:20:00Z",
            "2025-04-22T16:30:00Z",
        ),
        message(
            "4",
            "customer-1",
            "What tax deductions can I claim for my home office?",
            "For a home office, you can claim deductions using either the simplified method ($5 per square foot, up \
             to 300 sq ft) or the regular method (based on actual expenses). The space must be used regularly and \
             exclusively for business. You can deduct a portion of rent/mortgage, utilities, insurance, and repairs \
             proportional to your office space.",
            0.95,
            MessageStatus::Rejected,
            "2025-04-21T08:45:00Z",
            "2025-04-21T13:10:00Z",
        ),
        message(
            "5",
            "customer-4",
            "How do I report cryptocurrency gains on my taxes?",
            "Cryptocurrency is treated as property by the IRS. You must report capital gains or losses when you sell, \
             trade, or use crypto to purchase goods/services. Use Form 8949 and Schedule D. Keep detailed records of \
             acquisition dates, cost basis, and sale proceeds. Mining and staking rewards are typically reported as \
             ordinary income.",
            0.82,
            MessageStatus::Pending,
            "2025-04-20T15:30:00Z",
            "2025-04-20T15:30:00Z",
        ),
    ]
}

fn knowledge(
    id: &str, auditor_id: &str, item_type: KnowledgeItemType, content: KnowledgeContent, filename: Option<&str>,
    at: &str,
) -> KnowledgeItem {
    KnowledgeItem {
        id: id.to_string(),
        auditor_id: auditor_id.to_string(),
        item_type,
        content,
        filename: filename.map(str::to_string),
        created_at: stamp(at),
        updated_at: stamp(at),
    }
}

/// Reference material for the auditors
#[must_use]
pub fn seed_knowledge_items() -> Vec<KnowledgeItem> {
    vec![
        knowledge(
            "1",
            DEFAULT_AUDITOR_ID,
            KnowledgeItemType::File,
            KnowledgeContent::Binary(b"Mock PDF content".to_vec()),
            Some("tax-guidelines-2025.pdf"),
            "2025-04-20T10:30:00Z",
        ),
        knowledge(
            "2",
            DEFAULT_AUDITOR_ID,
            KnowledgeItemType::Text,
            "Important financial advice regarding retirement accounts and tax implications.".into(),
            None,
            "2025-04-22T14:15:00Z",
        ),
        knowledge(
            "3",
            DEFAULT_AUDITOR_ID,
            KnowledgeItemType::File,
            KnowledgeContent::Binary(b"Mock DOCX content".to_vec()),
            Some("investment-strategies.docx"),
            "2025-04-23T09:45:00Z",
        ),
        knowledge(
            "4",
            "auditor-2",
            KnowledgeItemType::Text,
            "Guidelines for handling client inquiries about cryptocurrency investments.".into(),
            None,
            "2025-04-24T11:20:00Z",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_shape() {
        let messages = seed_messages();
        assert_eq!(messages.len(), 5);
        assert!(messages.iter().all(|m| m.auditor_id == DEFAULT_AUDITOR_ID));
        assert_eq!(messages.iter().filter(|m| m.status == MessageStatus::Pending).count(), 2);
        assert_eq!(messages[1].history.len(), 1);

        let items = seed_knowledge_items();
        assert_eq!(items.iter().filter(|i| i.auditor_id == DEFAULT_AUDITOR_ID).count(), 3);
    }

    #[test]
    fn test_timestamps_parse() {
        let messages = seed_messages();
        assert_eq!(messages[0].created_at.to_rfc3339(), "2025-04-24T09:30:00+00:00");
    }
}
