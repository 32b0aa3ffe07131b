#![allow(missing_docs)]

use rstest::rstest;

use restgen_core::{Api, ApiClientError, CallParams};

mod common;
pub use self::common::*;

#[rstest]
fn should_reject_a_missing_path_parameter(drive: Api) {
    let invocation = drive.call("drive.files.get", CallParams::new());

    assert!(invocation.request().is_none());
    let error = invocation.construction_error().expect("fileId is missing");
    insta::assert_snapshot!(error, @"Missing required parameters for 'drive.files.get': fileId");
}

#[rstest]
fn should_treat_a_null_path_parameter_as_missing(drive: Api) {
    let params = CallParams::new().param("fileId", serde_json::Value::Null);

    let invocation = drive.call("drive.files.get", params);

    assert!(matches!(
        invocation.construction_error(),
        Some(ApiClientError::MissingRequiredParameters { missing, .. }) if missing == &["fileId"]
    ));
}

#[rstest]
fn should_substitute_path_parameters(drive: Api) {
    let invocation = drive.call("drive.files.get", CallParams::new().param("fileId", "abc123"));

    let request = invocation.request().expect("fileId is set");
    let uri = request.uri();
    assert_eq!(uri.origin(), "https://www.googleapis.com");
    assert_eq!(uri.pathname(), "/drive/v2/files/abc123");
    assert_eq!(uri.path(), "/drive/v2/files/abc123");
    assert_eq!(uri.query(), None);
    assert_eq!(uri.href(), "https://www.googleapis.com/drive/v2/files/abc123");
}

#[rstest]
fn should_not_encode_path_parameters(drive: Api) {
    let invocation = drive.call("drive.files.get", CallParams::new().param("fileId", "p@ram"));

    let request = invocation.request().expect("fileId is set");
    assert_eq!(request.uri().pathname(), "/drive/v2/files/p@ram");
}

#[rstest]
fn should_keep_path_parameters_out_of_the_query(drive: Api) {
    let params = CallParams::new().param("fileId", "abc123").param("hello", "world");

    let invocation = drive.call("drive.files.get", params);

    let request = invocation.request().expect("fileId is set");
    assert_eq!(request.uri().pathname(), "/drive/v2/files/abc123");
    assert_eq!(request.uri().query(), Some("hello=world"));
    assert_eq!(request.uri().path(), "/drive/v2/files/abc123?hello=world");
}

#[rstest]
fn should_substitute_several_path_parameters(gmail: Api) {
    let params = CallParams::new().param("userId", "me").param("id", "17");

    let invocation = gmail.call("gmail.users.messages.get", params);

    let request = invocation.request().expect("userId and id are set");
    assert_eq!(request.uri().pathname(), "/gmail/v1/users/me/messages/17");
}

#[rstest]
fn should_report_every_missing_path_parameter(compute: Api) {
    let params = CallParams::new().param("zone", "europe-west1-b").param("autoDelete", true).param("deviceName", "disk");

    let error = compute
        .call("compute.instances.setDiskAutoDelete", params)
        .construction_error()
        .map(ToString::to_string);

    insta::assert_snapshot!(
        error.unwrap_or_default(),
        @"Missing required parameters for 'compute.instances.setDiskAutoDelete': project, instance"
    );
}

#[rstest]
fn should_accept_colon_suffixed_templates() {
    let datastore = offline_api("datastore");

    let invocation = datastore.call("datastore.projects.lookup", CallParams::new().param("projectId", "demo"));

    let request = invocation.request().expect("projectId is set");
    assert_eq!(
        request.uri().href(),
        "https://datastore.googleapis.com/v1beta3/projects/demo:lookup"
    );
}
