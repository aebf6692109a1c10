//! Subcommands and their execution against a [`PortalContext`].

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use portal_core::{
  AuthProvider, TableStore,
  appointment::{Appointment, AppointmentPatch, AppointmentStatus, NewAppointment},
  health_check::{HealthCheck, NewHealthCheck},
  normalize::parse_analysis_results,
  profile::Profile,
};
use portal_sync::{
  PasswordChange, PasswordOutcome, PortalContext, ProfileForm, Stats,
  form::submit,
};
use serde::Serialize;
use uuid::Uuid;

use crate::photo;

// ─── Arguments ───────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Show or edit the signed-in user's profile.
  #[command(subcommand)]
  Profile(ProfileCommand),

  /// List, book or change appointments.
  #[command(subcommand)]
  Appointments(AppointmentCommand),

  /// List or record health checks.
  #[command(subcommand)]
  HealthChecks(HealthCheckCommand),

  /// Show usage counts.
  Stats,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
  Show,
  /// Change the given fields; everything else keeps its stored value.
  Edit(ProfileEdit),
}

#[derive(Args, Debug, Default)]
pub struct ProfileEdit {
  #[arg(long)]
  first_name:             Option<String>,
  #[arg(long)]
  last_name:              Option<String>,
  /// YYYY-MM-DD.
  #[arg(long)]
  date_of_birth:          Option<String>,
  #[arg(long)]
  gender:                 Option<String>,
  #[arg(long)]
  phone:                  Option<String>,
  #[arg(long)]
  address:                Option<String>,
  #[arg(long)]
  city:                   Option<String>,
  #[arg(long)]
  medical_history:        Option<String>,
  #[arg(long)]
  allergies:              Option<String>,
  #[arg(long)]
  medications:            Option<String>,
  #[arg(long)]
  emergency_name:         Option<String>,
  #[arg(long)]
  emergency_relationship: Option<String>,
  #[arg(long)]
  emergency_phone:        Option<String>,
  #[arg(long)]
  password:               Option<String>,
  #[arg(long)]
  confirm_password:       Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum AppointmentCommand {
  List,
  Book(BookArgs),
  Update(UpdateArgs),
}

#[derive(Args, Debug)]
pub struct BookArgs {
  #[arg(long)]
  doctor:    String,
  /// YYYY-MM-DD.
  #[arg(long)]
  date:      NaiveDate,
  /// Wall-clock time, e.g. 14:30.
  #[arg(long)]
  time:      String,
  #[arg(long)]
  specialty: Option<String>,
  #[arg(long)]
  reason:    Option<String>,
  /// pending, confirmed, cancelled or completed.
  #[arg(long)]
  status:    Option<String>,
  #[arg(long)]
  notes:     Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
  id:        Uuid,
  #[arg(long)]
  doctor:    Option<String>,
  #[arg(long)]
  specialty: Option<String>,
  #[arg(long)]
  date:      Option<NaiveDate>,
  #[arg(long)]
  time:      Option<String>,
  #[arg(long)]
  reason:    Option<String>,
  #[arg(long)]
  status:    Option<String>,
  #[arg(long)]
  notes:     Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum HealthCheckCommand {
  List,
  Save(SaveArgs),
}

#[derive(Args, Debug)]
pub struct SaveArgs {
  #[arg(long = "symptom", required = true)]
  symptoms:            Vec<String>,
  #[arg(long)]
  severity:            Option<String>,
  #[arg(long)]
  duration:            Option<String>,
  #[arg(long = "previous-condition")]
  previous_conditions: Vec<String>,
  #[arg(long = "medication")]
  medications:         Vec<String>,
  #[arg(long)]
  notes:               Option<String>,
  /// JSON file holding a list of analysed conditions.
  #[arg(long, value_name = "FILE")]
  analysis:            Option<PathBuf>,
  /// SYMPTOM=PATH_OR_URL; repeatable.
  #[arg(long = "photo")]
  photos:              Vec<String>,
  #[arg(long)]
  comprehensive:       bool,
  #[arg(long)]
  urgency:             Option<String>,
  #[arg(long)]
  assessment:          Option<String>,
}

// ─── Conversions ─────────────────────────────────────────────────────────────

/// Statuses are normalized like stored values, so a typo books as pending.
fn status(raw: &str) -> AppointmentStatus {
  let status = AppointmentStatus::normalize(Some(raw));
  if status.as_str() != raw {
    tracing::warn!(given = raw, used = %status, "unrecognised status");
  }
  status
}

impl ProfileEdit {
  fn apply(self, form: &mut ProfileForm) {
    let fields = [
      (self.first_name, &mut form.first_name),
      (self.last_name, &mut form.last_name),
      (self.date_of_birth, &mut form.date_of_birth),
      (self.gender, &mut form.gender),
      (self.phone, &mut form.phone),
      (self.address, &mut form.address),
      (self.city, &mut form.city),
      (self.medical_history, &mut form.medical_history),
      (self.allergies, &mut form.allergies),
      (self.medications, &mut form.medications),
      (self.emergency_name, &mut form.emergency_contact_name),
      (self.emergency_relationship, &mut form.emergency_contact_relationship),
      (self.emergency_phone, &mut form.emergency_contact_phone),
    ];
    for (value, slot) in fields {
      if let Some(value) = value {
        *slot = value;
      }
    }
  }

  fn password(&self) -> PasswordChange {
    PasswordChange {
      password: self.password.clone().unwrap_or_default(),
      confirm:  self.confirm_password.clone().unwrap_or_default(),
    }
  }
}

impl From<BookArgs> for NewAppointment {
  fn from(args: BookArgs) -> Self {
    NewAppointment {
      doctor_specialty: args.specialty,
      reason: args.reason,
      status: args.status.as_deref().map(status),
      notes: args.notes,
      ..NewAppointment::new(args.doctor, args.date, args.time)
    }
  }
}

impl UpdateArgs {
  fn patch(&self) -> AppointmentPatch {
    AppointmentPatch {
      doctor_name:      self.doctor.clone(),
      doctor_specialty: self.specialty.clone(),
      date:             self.date,
      time:             self.time.clone(),
      reason:           self.reason.clone(),
      status:           self.status.as_deref().map(status),
      notes:            self.notes.clone(),
    }
  }
}

impl SaveArgs {
  fn into_new(self) -> anyhow::Result<NewHealthCheck> {
    let analysis_results = match &self.analysis {
      Some(path) => {
        let raw = std::fs::read_to_string(path)
          .with_context(|| format!("failed to read analysis {}", path.display()))?;
        let value: serde_json::Value =
          serde_json::from_str(&raw).context("analysis file is not JSON")?;
        match parse_analysis_results(&value) {
          Some(conditions) => Some(conditions),
          None => bail!("analysis file must hold a list of conditions"),
        }
      }
      None => None,
    };

    Ok(NewHealthCheck {
      symptoms: self.symptoms,
      severity: self.severity,
      duration: self.duration,
      previous_conditions: self.previous_conditions,
      medications: self.medications,
      notes: self.notes,
      analysis_results,
      symptom_photos: photo::collect(&self.photos)?,
      comprehensive_analysis: self.comprehensive,
      urgency_level: self.urgency,
      overall_assessment: self.assessment,
    })
  }
}

// ─── Execution ───────────────────────────────────────────────────────────────

pub async fn run<T: TableStore, A: AuthProvider>(
  ctx: PortalContext<T, A>,
  command: Command,
  json: bool,
) -> anyhow::Result<()> {
  match command {
    Command::Profile(ProfileCommand::Show) => {
      let mut store = ctx.profile_store();
      store.fetch().await?;
      match store.profile() {
        Some(profile) if json => print_json(profile)?,
        Some(profile) => print_profile(profile),
        None => println!("No profile yet."),
      }
    }

    Command::Profile(ProfileCommand::Edit(edit)) => {
      let mut store = ctx.profile_store();
      store.fetch().await?;
      let mut form = ProfileForm::from_profile(store.profile());
      let password = edit.password();
      edit.apply(&mut form);

      let (profile, outcome) = submit(&mut store, &form, &password).await?;
      if json {
        print_json(&profile)?;
      } else {
        print_profile(&profile);
      }
      if outcome == PasswordOutcome::Mismatch {
        bail!("passwords do not match");
      }
    }

    Command::Appointments(AppointmentCommand::List) => {
      let mut store = ctx.appointment_store();
      store.fetch().await?;
      if json {
        print_json(store.appointments())?;
      } else if store.appointments().is_empty() {
        println!("No appointments.");
      } else {
        store.appointments().iter().for_each(print_appointment);
      }
    }

    Command::Appointments(AppointmentCommand::Book(args)) => {
      let mut store = ctx.appointment_store();
      let booked = store.add(&args.into()).await?;
      if json { print_json(&booked)? } else { print_appointment(&booked) }
    }

    Command::Appointments(AppointmentCommand::Update(args)) => {
      let mut store = ctx.appointment_store();
      let updated = store.update(args.id, &args.patch()).await?;
      if json { print_json(&updated)? } else { print_appointment(&updated) }
    }

    Command::HealthChecks(HealthCheckCommand::List) => {
      let mut store = ctx.health_check_store();
      store.fetch().await?;
      if json {
        print_json(store.health_checks())?;
      } else if store.health_checks().is_empty() {
        println!("No health checks.");
      } else {
        store.health_checks().iter().for_each(print_health_check);
      }
    }

    Command::HealthChecks(HealthCheckCommand::Save(args)) => {
      let new = args.into_new()?;
      let mut store = ctx.health_check_store();
      let saved = store.save(&new).await?;
      if json { print_json(&saved)? } else { print_health_check(&saved) }
    }

    Command::Stats => {
      let mut store = ctx.stats_store();
      store.fetch().await?;
      let stats = store.stats();
      if json {
        print_json(&stats_json(stats))?;
      } else {
        print_stats(stats);
      }
    }
  }
  Ok(())
}

// ─── Output ──────────────────────────────────────────────────────────────────

fn print_json<V: Serialize + ?Sized>(value: &V) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn print_profile(p: &Profile) {
  let name = [p.first_name.as_deref(), p.last_name.as_deref()]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");
  println!("{} ({})", if name.is_empty() { "(no name)" } else { &name }, p.id);

  let rows = [
    ("Date of birth", p.date_of_birth.map(|d| d.to_string())),
    ("Gender", p.gender.clone()),
    ("Phone", p.phone.clone()),
    ("Address", p.address.clone()),
    ("City", p.city.clone()),
    ("Medical history", p.medical_history.clone()),
    ("Allergies", p.allergies.clone()),
    ("Medications", p.medications.clone()),
    ("Emergency contact", p.emergency_contact_name.clone()),
    ("  relationship", p.emergency_contact_relationship.clone()),
    ("  phone", p.emergency_contact_phone.clone()),
  ];
  for (label, value) in rows {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
      println!("  {label:<18} {value}");
    }
  }
}

fn print_appointment(a: &Appointment) {
  let specialty = a
    .doctor_specialty
    .as_deref()
    .map(|s| format!(" ({s})"))
    .unwrap_or_default();
  println!(
    "{} {:<5}  {:<9}  {}{specialty}  {}",
    a.date, a.time, a.status.as_str(), a.doctor_name, a.id
  );
  if let Some(reason) = &a.reason {
    println!("    reason: {reason}");
  }
}

fn print_health_check(h: &HealthCheck) {
  let when = h
    .created_at
    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
    .unwrap_or_else(|| "-".to_owned());
  println!("{when}  {}  {}", h.symptoms.join(", "), h.id);

  let detail = [
    ("severity", h.severity.as_deref()),
    ("duration", h.duration.as_deref()),
    ("urgency", h.urgency_level.as_deref()),
  ];
  let detail: Vec<String> = detail
    .into_iter()
    .filter_map(|(k, v)| v.map(|v| format!("{k}: {v}")))
    .collect();
  if !detail.is_empty() {
    println!("    {}", detail.join("  "));
  }
  if let Some(top) = h.analysis_results.as_deref().and_then(|r| r.first()) {
    println!("    top match: {} ({:.0}%)", top.name, top.match_score);
  }
  if let Some(photos) = &h.symptom_photos {
    let names: Vec<&str> = photos.keys().map(String::as_str).collect();
    println!("    photos: {}", names.join(", "));
  }
}

fn stats_json(s: Stats) -> serde_json::Value {
  serde_json::json!({
    "appointments_count": s.appointments_count,
    "health_checks_count": s.health_checks_count,
    "upcoming_appointments": s.upcoming_appointments,
    "completed_health_checks": s.completed_health_checks,
  })
}

fn print_stats(s: Stats) {
  println!("Appointments:            {}", s.appointments_count);
  println!("  upcoming:              {}", s.upcoming_appointments);
  println!("Health checks:           {}", s.health_checks_count);
  println!("  completed:             {}", s.completed_health_checks);
}
