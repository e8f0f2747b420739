//! RDS database provider

use crate::error::to_cloud_error;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_rds::Client;
use aws_sdk_rds::types::{DbInstance, Tag};
use flipdb_cloud::{
    CreateInstanceRequest, DatabaseProvider, InstanceDescription, InstanceStatus, Result,
};
use std::collections::BTreeMap;

pub struct RdsDatabase {
    client: Client,
}

impl RdsDatabase {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl DatabaseProvider for RdsDatabase {
    fn name(&self) -> &str {
        "rds"
    }

    async fn create_from_source(&self, request: &CreateInstanceRequest) -> Result<()> {
        let security_groups: Vec<String> = request.security_group_ids.iter().cloned().collect();
        let tags = to_tags(&request.tags);

        let output = self
            .client
            .restore_db_instance_to_point_in_time()
            .source_db_instance_identifier(&request.source_identifier)
            .target_db_instance_identifier(&request.identifier)
            .use_latest_restorable_time(true)
            .db_instance_class(&request.instance_class)
            .availability_zone(&request.availability_zone)
            .db_subnet_group_name(&request.subnet_group_name)
            .publicly_accessible(request.publicly_accessible)
            .set_vpc_security_group_ids((!security_groups.is_empty()).then_some(security_groups))
            .set_tags((!tags.is_empty()).then_some(tags))
            .send()
            .await
            .map_err(to_cloud_error)?;

        let status = output
            .db_instance()
            .and_then(|i| i.db_instance_status())
            .unwrap_or("unknown");
        tracing::info!(
            "RDS accepted restore of {} from {} ({})",
            request.identifier,
            request.source_identifier,
            status
        );
        Ok(())
    }

    async fn describe(&self, identifier: &str) -> Result<Option<InstanceDescription>> {
        let result = self
            .client
            .describe_db_instances()
            .db_instance_identifier(identifier)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.db_instances().first().map(describe_instance)),
            Err(e) => {
                let err = to_cloud_error(e);
                if err.is_not_found() {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn set_master_password(&self, identifier: &str, password: &str) -> Result<()> {
        self.client
            .modify_db_instance()
            .db_instance_identifier(identifier)
            .master_user_password(password)
            .apply_immediately(true)
            .send()
            .await
            .map_err(to_cloud_error)?;
        Ok(())
    }

    async fn delete(&self, identifier: &str) -> Result<()> {
        self.client
            .delete_db_instance()
            .db_instance_identifier(identifier)
            .skip_final_snapshot(true)
            .send()
            .await
            .map_err(to_cloud_error)?;
        tracing::info!("RDS accepted deletion of {}", identifier);
        Ok(())
    }
}

fn to_tags(tags: &BTreeMap<String, String>) -> Vec<Tag> {
    tags.iter()
        .map(|(key, value)| Tag::builder().key(key).value(value).build())
        .collect()
}

fn describe_instance(instance: &DbInstance) -> InstanceDescription {
    InstanceDescription {
        identifier: instance
            .db_instance_identifier()
            .unwrap_or_default()
            .to_string(),
        status: InstanceStatus::from_provider(instance.db_instance_status().unwrap_or("unknown")),
        endpoint: instance
            .endpoint()
            .and_then(|e| e.address())
            .map(String::from),
    }
}
