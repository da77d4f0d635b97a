//! Codecs for versions, broadcasts, encodings, locations and policies

use super::{CodecError, DocumentCodec, FieldReader, FieldWriter, Fields};
use crate::model::{Broadcast, Encoding, Location, Policy, Version};

impl DocumentCodec for Version {
    fn encode(&self) -> Fields {
        FieldWriter::new()
            .put_opt("canonicalUri", self.canonical_uri.clone())
            .put_opt("duration", self.duration)
            .put_opt("publishedDuration", self.published_duration)
            .put_list("broadcasts", &self.broadcasts)
            .put_list("manifestedAs", &self.manifested_as)
            .finish()
    }

    fn decode(fields: &Fields) -> Result<Self, CodecError> {
        let reader = FieldReader::new(fields, "version");
        Ok(Version {
            canonical_uri: reader.string("canonicalUri")?,
            duration: reader.int("duration")?,
            published_duration: reader.int("publishedDuration")?,
            broadcasts: reader.list("broadcasts")?,
            manifested_as: reader.list("manifestedAs")?,
        })
    }
}

impl DocumentCodec for Broadcast {
    fn encode(&self) -> Fields {
        FieldWriter::new()
            .put("broadcastOn", self.broadcast_on.as_str())
            .put("transmissionTime", self.transmission_time)
            .put("transmissionEndTime", self.transmission_end_time)
            .put("broadcastDuration", self.duration())
            .put_opt("repeat", self.repeat)
            .put_opt("id", self.source_id.clone())
            .finish()
    }

    fn decode(fields: &Fields) -> Result<Self, CodecError> {
        let reader = FieldReader::new(fields, "broadcast");
        Ok(Broadcast {
            broadcast_on: reader.required_string("broadcastOn")?,
            transmission_time: reader.required_datetime("transmissionTime")?,
            transmission_end_time: reader.required_datetime("transmissionEndTime")?,
            repeat: reader.bool("repeat")?,
            source_id: reader.string("id")?,
        })
    }
}

impl DocumentCodec for Encoding {
    fn encode(&self) -> Fields {
        FieldWriter::new()
            .put_opt("dataContainerFormat", self.data_container_format.clone())
            .put_opt("bitRate", self.bit_rate)
            .put_opt("videoCoding", self.video_coding.clone())
            .put_opt("audioCoding", self.audio_coding.clone())
            .put_list("availableAt", &self.available_at)
            .finish()
    }

    fn decode(fields: &Fields) -> Result<Self, CodecError> {
        let reader = FieldReader::new(fields, "encoding");
        Ok(Encoding {
            data_container_format: reader.string("dataContainerFormat")?,
            bit_rate: reader.int("bitRate")?,
            video_coding: reader.string("videoCoding")?,
            audio_coding: reader.string("audioCoding")?,
            available_at: reader.list("availableAt")?,
        })
    }
}

impl DocumentCodec for Location {
    fn encode(&self) -> Fields {
        FieldWriter::new()
            .put_opt("uri", self.uri.clone())
            .put("available", self.available)
            .put_enum("transportType", self.transport_type)
            .put_entity("policy", self.policy.as_ref())
            .finish()
    }

    fn decode(fields: &Fields) -> Result<Self, CodecError> {
        let reader = FieldReader::new(fields, "location");
        Ok(Location {
            uri: reader.string("uri")?,
            available: reader.bool("available")?.unwrap_or(true),
            transport_type: reader.enum_key("transportType")?,
            policy: reader.entity("policy")?,
        })
    }
}

impl DocumentCodec for Policy {
    fn encode(&self) -> Fields {
        FieldWriter::new()
            .put_set("availableCountries", &self.available_countries)
            .put_opt("availabilityStart", self.availability_start)
            .put_opt("availabilityEnd", self.availability_end)
            .finish()
    }

    fn decode(fields: &Fields) -> Result<Self, CodecError> {
        let reader = FieldReader::new(fields, "policy");
        Ok(Policy {
            available_countries: reader.string_set("availableCountries")?,
            availability_start: reader.datetime("availabilityStart")?,
            availability_end: reader.datetime("availabilityEnd")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Value;
    use crate::model::TransportType;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_version_fields() {
        let start = Utc.with_ymd_and_hms(2010, 3, 1, 20, 0, 0).unwrap();
        let version = Version {
            duration: Some(1800),
            broadcasts: vec![Broadcast::new(
                "http://www.bbc.co.uk/services/bbcone",
                start,
                start + chrono::Duration::minutes(30),
            )],
            manifested_as: vec![Encoding {
                data_container_format: Some("video/mp4".to_string()),
                available_at: vec![Location {
                    transport_type: Some(TransportType::Link),
                    policy: Some(Policy {
                        available_countries: ["GB".to_string()].into_iter().collect(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        let fields = version.encode();
        assert_eq!(fields.get("duration"), Some(&Value::Int64(1800)));
        assert!(!fields.contains_key("publishedDuration"));

        let broadcast = &fields["broadcasts"].as_array().unwrap()[0];
        assert_eq!(
            broadcast.as_object().unwrap().get("broadcastDuration"),
            Some(&Value::Int64(1800))
        );

        let location = &fields["manifestedAs"].as_array().unwrap()[0]
            .as_object()
            .unwrap()["availableAt"]
            .as_array()
            .unwrap()[0];
        let location = location.as_object().unwrap();
        assert_eq!(location.get("transportType").and_then(Value::as_str), Some("link"));
        assert_eq!(location.get("available"), Some(&Value::Bool(true)));

        assert_eq!(Version::decode(&fields).unwrap(), version);
    }

    #[test]
    fn test_broadcast_requires_times() {
        let mut fields = Fields::new();
        fields.insert("broadcastOn".to_string(), "http://channel".into());
        match Broadcast::decode(&fields) {
            Err(CodecError::MissingField { entity, field }) => {
                assert_eq!(entity, "broadcast");
                assert_eq!(field, "transmissionTime");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_location_rejects_unknown_transport() {
        let mut fields = Fields::new();
        fields.insert("transportType".to_string(), "carrier-pigeon".into());
        assert!(matches!(
            Location::decode(&fields),
            Err(CodecError::UnknownEnumKey { .. })
        ));
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let mut fields = Fields::new();
        fields.insert("duration".to_string(), "long".into());
        assert!(matches!(
            Version::decode(&fields),
            Err(CodecError::WrongType { expected: "integer", .. })
        ));
    }
}
