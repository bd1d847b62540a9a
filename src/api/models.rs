use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactSource {
    Phone,
    Manual,
    Cloud,
}

impl ContactSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactSource::Phone => "phone",
            ContactSource::Manual => "manual",
            ContactSource::Cloud => "cloud",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub source: ContactSource,
}

impl Contact {
    pub fn new(id: impl Into<String>, name: impl Into<String>, phone_number: impl Into<String>, source: ContactSource) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone_number: phone_number.into(),
            source,
        }
    }
}

/// A named snapshot of contacts. Members are copied at creation and never
/// edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub contacts: Vec<Contact>,
    /// Unix time in milliseconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendStatus {
    pub contact_name: String,
    pub phone_number: String,
    pub status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    Groups,
    CreateGroup,
    History,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            View::Home => "home",
            View::Groups => "groups",
            View::CreateGroup => "create-group",
            View::History => "history",
        }
    }
}

/// Contacts present on first launch, before anything was persisted.
pub fn initial_contacts() -> Vec<Contact> {
    vec![
        Contact::new("1", "أحمد محمد", "0501234567", ContactSource::Manual),
        Contact::new("2", "سارة خالد", "0559876543", ContactSource::Manual),
    ]
}

/// Name and phone pairs appended by the cloud-backup fallback sync.
pub const CLOUD_BACKUP: [(&str, &str); 6] = [
    ("فيصل العبدالله", "0560001112"),
    ("ريما القاسم", "0544443332"),
    ("طلال الحربي", "0522221110"),
    ("هيفاء السعيد", "0588889990"),
    ("سلطان الدوسري", "0577776665"),
    ("مها الزهراني", "0509998887"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_uses_camel_case_on_the_wire() {
        let contact = Contact::new("1", "أحمد محمد", "0501234567", ContactSource::Manual);
        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["phoneNumber"], "0501234567");
        assert_eq!(json["source"], "manual");
    }

    #[test]
    fn reads_group_records_in_the_stored_format() {
        let raw = r#"[{"id":"1700000000000","name":"VIP","createdAt":1700000000000,
            "contacts":[{"id":"c1","name":"فيصل العبدالله","phoneNumber":"0560001112","source":"cloud"}]}]"#;
        let groups: Vec<Group> = serde_json::from_str(raw).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].contacts[0].source, ContactSource::Cloud);
        assert_eq!(groups[0].created_at, 1_700_000_000_000);
    }
}
