#![cfg(test)]

use std::path::Path;

use crate::plugin_system::bean::PluginBean;
use crate::plugin_system::permissions::PluginPermissionType;

fn parse(xml: &str) -> PluginBean {
    PluginBean::parse(xml.as_bytes(), Path::new("test-plugin")).expect("descriptor should parse")
}

#[test]
fn test_parse_full_descriptor() {
    let bean = parse(
        r#"<plugin>
            <id>com.example.tool</id>
            <name>Example Tool</name>
            <version>1.2.3</version>
            <platformVersion>214</platformVersion>
            <category>Tooling</category>
            <description>Does example things.</description>
            <vendor email="dev@example.com" url="https://example.com">Example Inc</vendor>
            <depends>com.example.base</depends>
            <depends optional="true">com.example.extra</depends>
            <incompatible-with>com.example.rival</incompatible-with>
            <tags>
                <tag>build</tag>
                <tag>tooling</tag>
            </tags>
            <experimental>true</experimental>
        </plugin>"#,
    );

    assert_eq!(bean.id.as_str(), "com.example.tool");
    assert_eq!(bean.name, "Example Tool");
    assert_eq!(bean.version.as_deref(), Some("1.2.3"));
    assert_eq!(bean.platform_version.as_deref(), Some("214"));
    assert_eq!(bean.category.as_deref(), Some("Tooling"));
    assert_eq!(bean.vendor.name.as_deref(), Some("Example Inc"));
    assert_eq!(bean.vendor.email.as_deref(), Some("dev@example.com"));
    assert_eq!(bean.vendor.url.as_deref(), Some("https://example.com"));
    assert_eq!(bean.dependencies.len(), 2);
    assert!(!bean.dependencies[0].optional);
    assert!(bean.dependencies[1].optional);
    assert_eq!(bean.incompatible_with.len(), 1);
    assert_eq!(bean.tags, vec!["build", "tooling"]);
    assert!(bean.experimental);
}

#[test]
fn test_id_falls_back_to_name() {
    let bean = parse("<plugin><name>Only Name</name></plugin>");
    assert_eq!(bean.id.as_str(), "Only Name");
    assert_eq!(bean.name, "Only Name");
}

#[test]
fn test_name_falls_back_to_id() {
    let bean = parse("<plugin><id>only.id</id></plugin>");
    assert_eq!(bean.name, "only.id");
}

#[test]
fn test_descriptor_without_id_and_name_is_rejected() {
    let result = PluginBean::parse(
        b"<plugin><version>1.0</version></plugin>",
        Path::new("broken-plugin"),
    );
    assert!(result.is_err());
}

#[test]
fn test_malformed_xml_is_rejected() {
    let result = PluginBean::parse(b"<plugin><id>x</id>", Path::new("broken-plugin"));
    assert!(result.is_err());
}

#[test]
fn test_unknown_permission_type_is_dropped() {
    let bean = parse(
        r#"<plugin>
            <id>com.example.tool</id>
            <permissions>
                <permission type="PROCESS">
                    <allow-option>/usr/bin/git</allow-option>
                </permission>
                <permission type="TELEPORT"/>
            </permissions>
        </plugin>"#,
    );

    let process = bean
        .permissions
        .get(&PluginPermissionType::Process)
        .expect("known permission should survive");
    assert!(process.allowed_scopes().contains("/usr/bin/git"));
    assert_eq!(bean.permissions.len(), 1);
}

#[test]
fn test_actions_are_carried_verbatim() {
    let bean = parse(
        r#"<plugin>
            <id>com.example.tool</id>
            <actions>
                <action id="Run" class="demo.RunAction"/>
            </actions>
        </plugin>"#,
    );
    assert_eq!(bean.actions.len(), 1);
    assert!(bean.actions[0].get_child("action").is_some());
}
