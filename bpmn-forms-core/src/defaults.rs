//! Canned documents and the records stores seed themselves with.

use crate::form_schema::FormSchema;
use crate::types::{FormDraft, ProcessDraft};
use serde_json::json;

/// Diagram used for new processes and as the import fallback.
pub const DEFAULT_DIAGRAM_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
                  xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL"
                  xmlns:bpmndi="http://www.omg.org/spec/BPMN/20100524/DI"
                  id="Definitions_1"
                  targetNamespace="http://bpmn.io/schema/bpmn">
  <bpmn:process id="Process_1" isExecutable="false">
    <bpmn:startEvent id="StartEvent_1" />
  </bpmn:process>
  <bpmndi:BPMNDiagram id="BPMNDiagram_1">
    <bpmndi:BPMNPlane id="BPMNPlane_1" bpmnElement="Process_1">
      <bpmndi:BPMNShape id="_BPMNShape_StartEvent_2" bpmnElement="StartEvent_1">
        <dc:Bounds xmlns:dc="http://www.omg.org/spec/DD/20100524/DC" x="173" y="102" width="36" height="36" />
      </bpmndi:BPMNShape>
    </bpmndi:BPMNPlane>
  </bpmndi:BPMNDiagram>
</bpmn:definitions>"#;

pub const DEFAULT_PROCESS_NAME: &str = "Order Request";
pub const DEFAULT_FORM_NAME: &str = "Request Form";

/// Seeded process: start → "Review Data" (user task) → end.
pub const ORDER_REQUEST_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL"
                  xmlns:bpmndi="http://www.omg.org/spec/BPMN/20100524/DI"
                  xmlns:dc="http://www.omg.org/spec/DD/20100524/DC"
                  xmlns:di="http://www.omg.org/spec/DD/20100524/DI"
                  id="Definitions_OrderRequest"
                  targetNamespace="http://bpmn.io/schema/bpmn">
  <bpmn:process id="Process_OrderRequest" isExecutable="false">
    <bpmn:startEvent id="StartEvent_1" name="Order received">
      <bpmn:outgoing>Flow_1</bpmn:outgoing>
    </bpmn:startEvent>
    <bpmn:userTask id="Activity_ReviewData" name="Review Data">
      <bpmn:incoming>Flow_1</bpmn:incoming>
      <bpmn:outgoing>Flow_2</bpmn:outgoing>
    </bpmn:userTask>
    <bpmn:endEvent id="EndEvent_1" name="Order handled">
      <bpmn:incoming>Flow_2</bpmn:incoming>
    </bpmn:endEvent>
    <bpmn:sequenceFlow id="Flow_1" sourceRef="StartEvent_1" targetRef="Activity_ReviewData" />
    <bpmn:sequenceFlow id="Flow_2" sourceRef="Activity_ReviewData" targetRef="EndEvent_1" />
  </bpmn:process>
  <bpmndi:BPMNDiagram id="BPMNDiagram_1">
    <bpmndi:BPMNPlane id="BPMNPlane_1" bpmnElement="Process_OrderRequest">
      <bpmndi:BPMNShape id="StartEvent_1_di" bpmnElement="StartEvent_1">
        <dc:Bounds x="173" y="102" width="36" height="36" />
      </bpmndi:BPMNShape>
      <bpmndi:BPMNShape id="Activity_ReviewData_di" bpmnElement="Activity_ReviewData">
        <dc:Bounds x="260" y="80" width="100" height="80" />
      </bpmndi:BPMNShape>
      <bpmndi:BPMNShape id="EndEvent_1_di" bpmnElement="EndEvent_1">
        <dc:Bounds x="412" y="102" width="36" height="36" />
      </bpmndi:BPMNShape>
      <bpmndi:BPMNEdge id="Flow_1_di" bpmnElement="Flow_1">
        <di:waypoint x="209" y="120" />
        <di:waypoint x="260" y="120" />
      </bpmndi:BPMNEdge>
      <bpmndi:BPMNEdge id="Flow_2_di" bpmnElement="Flow_2">
        <di:waypoint x="360" y="120" />
        <di:waypoint x="412" y="120" />
      </bpmndi:BPMNEdge>
    </bpmndi:BPMNPlane>
  </bpmndi:BPMNDiagram>
</bpmn:definitions>"#;

pub fn default_process_draft() -> ProcessDraft {
    ProcessDraft {
        name: DEFAULT_PROCESS_NAME.to_string(),
        description: "Receives an order and routes it for data review".to_string(),
        xml: ORDER_REQUEST_XML.to_string(),
    }
}

pub fn default_form_draft() -> FormDraft {
    FormDraft {
        name: DEFAULT_FORM_NAME.to_string(),
        description: "Form for submitting requests".to_string(),
        schema: request_form_schema(),
    }
}

/// Full request form: contact fields, subject, description, terms, submit.
pub fn request_form_schema() -> FormSchema {
    FormSchema::normalize(json!({
        "type": "default",
        "components": [
            {
                "type": "text",
                "text": "# Request Form\n\nFill in the fields below to submit your request."
            },
            {
                "key": "name",
                "label": "Full Name",
                "type": "textfield",
                "placeholder": "Enter your full name",
                "validate": { "required": true }
            },
            {
                "key": "email",
                "label": "Email",
                "type": "textfield",
                "inputType": "email",
                "placeholder": "Enter your email",
                "validate": { "required": true }
            },
            {
                "key": "phone",
                "label": "Phone",
                "type": "textfield",
                "placeholder": "Enter your phone number",
                "validate": { "required": true }
            },
            {
                "key": "subject",
                "label": "Request Subject",
                "type": "select",
                "placeholder": "Select a subject",
                "data": {
                    "values": [
                        { "label": "Information", "value": "information" },
                        { "label": "Complaint", "value": "complaint" },
                        { "label": "Suggestion", "value": "suggestion" },
                        { "label": "Other", "value": "other" }
                    ]
                },
                "validate": { "required": true }
            },
            {
                "key": "description",
                "label": "Description",
                "type": "textarea",
                "placeholder": "Describe your request",
                "rows": 4,
                "validate": { "required": true }
            },
            {
                "key": "terms",
                "label": "I agree to the terms and conditions",
                "type": "checkbox",
                "validate": { "required": true }
            },
            {
                "key": "submit",
                "label": "Send Request",
                "type": "button",
                "theme": "primary"
            }
        ],
        "schemaVersion": 5
    }))
}
