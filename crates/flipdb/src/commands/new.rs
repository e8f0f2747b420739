use crate::context::Context;
use clap::{ArgAction, Args};
use colored::Colorize;
use flipdb_core::{Descriptor, DnsConfig, NewDeployment, parse_security_groups, parse_tags};

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Deployment name
    pub name: Option<String>,

    /// Instance every deployment is restored from
    #[arg(long, default_value = "")]
    pub source_db_instance_identifier: String,

    /// Base of the instance identifiers; `-blue` / `-green` are appended
    #[arg(long, default_value = "")]
    pub db_instance_identifier_base: String,

    /// Master password applied to freshly restored instances
    #[arg(long, env = "FLIPDB_DB_MASTER_USER_PASSWORD", default_value = "", hide_env_values = true)]
    pub db_master_user_password: String,

    /// Instance tags, `key1=value1,key2=value2`
    #[arg(long, default_value = "")]
    pub db_instance_tags: String,

    #[arg(long, default_value = "")]
    pub availability_zone: String,

    #[arg(long, default_value = "")]
    pub db_subnet_group_name: String,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub publicly_accessible: bool,

    #[arg(long, default_value = "db.m3.medium")]
    pub db_instance_class: String,

    /// Comma separated VPC security group ids
    #[arg(long, default_value = "")]
    pub vpc_security_group_ids: String,

    #[arg(long, env = "DNSIMPLE_AUTH_TOKEN", default_value = "", hide_env_values = true)]
    pub dnsimple_auth_token: String,

    #[arg(long, env = "DNSIMPLE_ACCOUNT_ID", default_value = "")]
    pub dnsimple_account_id: String,

    /// Zone holding the record
    #[arg(long, default_value = "")]
    pub dnsimple_domain: String,

    #[arg(long, default_value_t = 0)]
    pub dnsimple_record_id: u64,

    /// Record name within the zone, e.g. `db`
    #[arg(long, default_value = "")]
    pub dnsimple_record_name: String,

    #[arg(long, default_value_t = 60)]
    pub dnsimple_record_ttl: u32,

    /// Roll back on the next `deploy` instead of deploying
    #[arg(long)]
    pub rollback: bool,

    /// Overwrite an existing descriptor
    #[arg(long)]
    pub force: bool,
}

impl NewArgs {
    /// Build validated parameters; nothing has been sent anywhere yet
    pub fn to_params(&self) -> flipdb_core::Result<NewDeployment> {
        let mut params = NewDeployment {
            name: self.name.clone().unwrap_or_default(),
            source_instance_identifier: self.source_db_instance_identifier.clone(),
            instance_identifier_base: self.db_instance_identifier_base.clone(),
            availability_zone: self.availability_zone.clone(),
            subnet_group_name: self.db_subnet_group_name.clone(),
            master_password: self.db_master_user_password.clone(),
            instance_class: self.db_instance_class.clone(),
            publicly_accessible: self.publicly_accessible,
            security_group_ids: parse_security_groups(&self.vpc_security_group_ids),
            instance_tags: Default::default(),
            dns: DnsConfig {
                auth_token: self.dnsimple_auth_token.clone(),
                account_id: self.dnsimple_account_id.clone(),
                domain: self.dnsimple_domain.clone(),
                record_id: self.dnsimple_record_id,
                record_name: self.dnsimple_record_name.clone(),
                ttl: self.dnsimple_record_ttl,
            },
            rollback: self.rollback,
        };
        params.validate()?;
        params.instance_tags = parse_tags(&self.db_instance_tags)?;
        Ok(params)
    }
}

pub async fn handle(args: NewArgs) -> anyhow::Result<()> {
    let params = args.to_params()?;
    let descriptor = Descriptor::initial(&params)?;

    let context = Context::load().await?;
    let store = context.store();

    if store.exists(&params.name).await? && !args.force {
        anyhow::bail!(
            "deployment '{}' already exists at s3://{}/{}; pass --force to overwrite",
            params.name,
            store.bucket(),
            store.key(&params.name)
        );
    }

    store.save(&params.name, &descriptor).await?;

    println!(
        "{} {}",
        "✓ Created deployment".green().bold(),
        params.name.cyan()
    );
    println!("  active:  {}", descriptor.current.instance_identifier);
    println!("  standby: {}", descriptor.previous.instance_identifier);
    println!("  record:  {}", descriptor.dns.fqdn());
    println!();
    println!("Run `flipdb deploy {}` to provision the first instance", params.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: NewArgs,
    }

    fn parse(extra: &[&str]) -> NewArgs {
        let mut argv = vec![
            "flipdb-new",
            "orders-db",
            "--source-db-instance-identifier",
            "orders-db-src",
            "--db-instance-identifier-base",
            "orders",
            "--availability-zone",
            "ap-northeast-1a",
            "--db-subnet-group-name",
            "private",
            "--dnsimple-account-id",
            "1010",
            "--dnsimple-domain",
            "example.com",
            "--dnsimple-record-id",
            "42",
        ];
        argv.extend_from_slice(extra);
        TestCli::try_parse_from(argv).unwrap().args
    }

    #[test]
    fn test_defaults() {
        let params = parse(&[]).to_params().unwrap();
        assert_eq!(params.name, "orders-db");
        assert_eq!(params.instance_class, "db.m3.medium");
        assert!(params.publicly_accessible);
        assert!(!params.rollback);
        assert_eq!(params.dns.ttl, 60);
        assert!(params.security_group_ids.is_empty());
        assert!(params.instance_tags.is_empty());
    }

    #[test]
    fn test_rollback_independent_of_public_access() {
        let params = parse(&["--publicly-accessible", "false", "--rollback"])
            .to_params()
            .unwrap();
        assert!(!params.publicly_accessible);
        assert!(params.rollback);

        let params = parse(&["--publicly-accessible", "true"]).to_params().unwrap();
        assert!(params.publicly_accessible);
        assert!(!params.rollback);
    }

    #[test]
    fn test_lists() {
        let params = parse(&[
            "--vpc-security-group-ids",
            "sg-1,sg-2",
            "--db-instance-tags",
            "team=orders,env=prod",
        ])
        .to_params()
        .unwrap();
        assert_eq!(params.security_group_ids.len(), 2);
        assert_eq!(params.instance_tags.get("env").map(String::as_str), Some("prod"));
    }

    #[test]
    fn test_illegal_tags() {
        let err = parse(&["--db-instance-tags", "team"]).to_params().unwrap_err();
        assert!(err.to_string().contains("illegal format"));
    }

    #[test]
    fn test_missing_record_id() {
        let args = TestCli::try_parse_from([
            "flipdb-new",
            "orders-db",
            "--source-db-instance-identifier",
            "orders-db-src",
            "--db-instance-identifier-base",
            "orders",
            "--availability-zone",
            "ap-northeast-1a",
            "--db-subnet-group-name",
            "private",
            "--dnsimple-account-id",
            "1010",
            "--dnsimple-domain",
            "example.com",
        ])
        .unwrap()
        .args;
        let err = args.to_params().unwrap_err();
        assert!(err.to_string().contains("record ID"));
    }

    #[test]
    fn test_missing_name() {
        let args = TestCli::try_parse_from([
            "flipdb-new",
            "--source-db-instance-identifier",
            "orders-db-src",
            "--db-instance-identifier-base",
            "orders",
            "--availability-zone",
            "ap-northeast-1a",
            "--db-subnet-group-name",
            "private",
        ])
        .unwrap()
        .args;
        let err = args.to_params().unwrap_err();
        assert!(err.to_string().contains("deployment name"));
    }
}
