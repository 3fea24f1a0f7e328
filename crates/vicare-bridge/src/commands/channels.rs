//! `channels`: the declared channel table.

use serde::Serialize;
use tabled::Tabled;

use vicare_core::{Channel, STANDARD_CHANNELS};

use crate::cli::GlobalOpts;
use crate::output;

#[derive(Serialize)]
struct ChannelView {
    key: u8,
    name: &'static str,
    kind: String,
    host_type: &'static str,
    attribute: String,
}

impl From<&Channel> for ChannelView {
    fn from(c: &Channel) -> Self {
        Self {
            key: c.key.get(),
            name: c.name,
            kind: c.kind().to_string(),
            host_type: c.kind().host_type_name(),
            attribute: c.attribute.to_string(),
        }
    }
}

#[derive(Tabled)]
struct ChannelRow {
    #[tabled(rename = "Key")]
    key: u8,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Host Type")]
    host_type: String,
    #[tabled(rename = "Attribute")]
    attribute: String,
}

pub fn handle(global: &GlobalOpts) {
    let views: Vec<ChannelView> = STANDARD_CHANNELS.iter().map(ChannelView::from).collect();
    let out = output::render_list(&global.output, &views, |v| ChannelRow {
        key: v.key,
        name: v.name.to_owned(),
        kind: v.kind.clone(),
        host_type: v.host_type.to_owned(),
        attribute: v.attribute.clone(),
    });
    output::print_output(&out, global.quiet);
}
