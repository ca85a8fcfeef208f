// example/src/main.rs

use std::error::Error;

use tidewire::{compile_str, decode_xml, encode_xml, json, FieldValue, MessageInstance, Value};

const SCHEMA: &str = r#"
namespace "urn:fleet:v1";

message Placement {
  required string availabilityZone;
  optional string groupName;
}

message RunRequest {
  required string imageId;
  required int instanceCount;
  optional bool monitoring;
  repeated string securityGroup;
  choice target {
    string zoneName;
    Placement placement;
  }
}
"#;

fn main() -> Result<(), Box<dyn Error>> {
    let compiled = compile_str(SCHEMA)?;
    let request_schema = compiled.get("RunRequest").ok_or("RunRequest is not declared")?;

    // Build a request by wire name. Setting a choice member displaces
    // whichever sibling was active, so the last write to `target` wins.
    let mut request = MessageInstance::new(request_schema);
    request.set("imageId", FieldValue::Primitive(Value::String("ami-1a2b3c".into())));
    request.set("instanceCount", FieldValue::Primitive(Value::Int(3)));
    request.set("monitoring", FieldValue::Primitive(Value::Bool(true)));
    request.push("securityGroup", FieldValue::Primitive(Value::String("web".into())));
    request.push("securityGroup", FieldValue::Primitive(Value::String("ssh".into())));
    request.set("zoneName", FieldValue::Primitive(Value::String("us-east-1a".into())));

    let mut placement = MessageInstance::new(compiled.get("Placement").ok_or("Placement is not declared")?);
    placement.set(
        "availabilityZone",
        FieldValue::Primitive(Value::String("us-east-1b".into())),
    );
    request.set("placement", FieldValue::Message(placement));

    // One XML document out, the same instance back in.
    let text = encode_xml(&request, compiled.namespace(), "RunRequest")?;
    println!("wire document:\n{}\n", text);

    let decoded = decode_xml(request_schema, compiled.registry(), &text)?;
    assert_eq!(decoded, request);
    println!("zoneName set  = {}", decoded.is_set("zoneName"));
    println!("placement set = {}", decoded.is_set("placement"));

    // The JSON bridge shows only the active choice member.
    let value = json::instance_to_json(&decoded);
    println!("as JSON:\n{}", serde_json::to_string_pretty(&value)?);

    Ok(())
}
