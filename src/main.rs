/// Command-line dashboard for the patient appointment queue.
///
/// Provides an interactive menu for registering appointments, serving the
/// next patient, completing and rescheduling appointments, and viewing the
/// pending queue in serving order.

use chrono::{Local, NaiveDate, NaiveTime};
use clinic_queue::logging::init_logging;
use clinic_queue::models::{parse_date, parse_time};
use clinic_queue::{
    create_appointment_request, for_doctor, search, Appointment, Scheduler, SchedulerConfig,
    UrgencyLevel,
};
use std::io::{self, BufRead, Write};
use tracing::{error, info};

struct QueueCLI {
    scheduler: Scheduler,
    now_serving: Option<Appointment>,
    running: bool,
}

impl QueueCLI {
    fn new(config: SchedulerConfig) -> Self {
        QueueCLI {
            scheduler: Scheduler::new(config),
            now_serving: None,
            running: true,
        }
    }

    fn print_header(&self) {
        println!("\n{}", "=".repeat(60));
        println!("       PATIENT APPOINTMENT QUEUE");
        println!("{}", "=".repeat(60));
    }

    fn print_menu(&self) {
        println!("\n--- Main Menu ---");
        println!("1. Register appointment");
        println!("2. Serve next patient");
        println!("3. Mark appointment complete");
        println!("4. Reschedule appointment");
        println!("5. View pending queue");
        println!("6. Search pending appointments");
        println!("7. Doctor's queue");
        println!("8. Queue statistics");
        println!("9. Export pending queue (JSON)");
        println!("10. Run demo");
        println!("0. Exit");
        println!("{}", "-".repeat(20));
    }

    /// Read one trimmed line. Returns `None` on end of input.
    fn get_input(&mut self, prompt: &str, default: Option<&str>) -> Option<String> {
        match default {
            Some(def) => print!("{} [{}]: ", prompt, def),
            None => print!("{}: ", prompt),
        }
        let _ = io::stdout().flush();

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(0) | Err(_) => {
                self.running = false;
                return None;
            }
            Ok(_) => {}
        }

        let input = input.trim();
        if input.is_empty() {
            Some(default.unwrap_or("").to_string())
        } else {
            Some(input.to_string())
        }
    }

    fn get_int_input(&mut self, prompt: &str, default: Option<i32>) -> Option<i32> {
        loop {
            let default_str = default.map(|d| d.to_string());
            let input = self.get_input(prompt, default_str.as_deref())?;

            if let Ok(value) = input.parse::<i32>() {
                return Some(value);
            }
            println!("Please enter a valid number");
        }
    }

    fn get_level_input(&mut self, prompt: &str, default: &str) -> Option<UrgencyLevel> {
        loop {
            let input = self.get_input(prompt, Some(default))?;
            match input.parse::<UrgencyLevel>() {
                Ok(level) => return Some(level),
                Err(e) => println!("{}", e),
            }
        }
    }

    fn get_date_time_input(&mut self) -> Option<(NaiveDate, NaiveTime)> {
        let today = Local::now().format("%Y-%m-%d").to_string();
        let date = loop {
            let input = self.get_input("Date (YYYY-MM-DD)", Some(&today))?;
            match parse_date(&input) {
                Ok(date) => break date,
                Err(e) => println!("{}", e),
            }
        };
        let time = loop {
            let input = self.get_input("Time (HH:MM)", Some("09:00"))?;
            match parse_time(&input) {
                Ok(time) => break time,
                Err(e) => println!("{}", e),
            }
        };
        Some((date, time))
    }

    fn print_appointment(index: usize, apt: &Appointment) {
        println!(
            "  {:>2}. [{:9}] {:20} {} {}  {}",
            index,
            apt.level.name(),
            apt.patient_name,
            apt.date.format("%Y-%m-%d"),
            apt.time.format("%H:%M"),
            apt.doctor.as_deref().unwrap_or("-")
        );
    }

    fn print_queue(title: &str, appointments: &[Appointment]) {
        if appointments.is_empty() {
            println!("\nNo pending appointments");
            return;
        }

        println!("\n--- {} ({}) ---", title, appointments.len());
        for (i, apt) in appointments.iter().enumerate() {
            Self::print_appointment(i + 1, apt);
        }
    }

    /// Let the user pick a pending appointment by its queue position.
    fn select_pending(&mut self, prompt: &str) -> Option<Appointment> {
        let pending = self.scheduler.list_pending();
        if pending.is_empty() {
            println!("\nNo pending appointments");
            return None;
        }

        Self::print_queue("Pending Queue", &pending);
        let choice = self.get_int_input(prompt, Some(0))?;
        if choice <= 0 || choice as usize > pending.len() {
            return None;
        }
        pending.into_iter().nth(choice as usize - 1)
    }

    fn register_appointment(&mut self) {
        println!("\n--- Register Appointment ---");

        let Some(name) = self.get_input("Patient name", None) else { return };
        let Some((date, time)) = self.get_date_time_input() else { return };

        println!("\nUrgency levels: critical, emergency, accident, normal");
        let Some(level) = self.get_level_input("Urgency level", "normal") else { return };
        let Some(doctor) = self.get_input("Doctor (optional)", Some("")) else { return };

        let date = date.format("%Y-%m-%d").to_string();
        let time = time.format("%H:%M").to_string();
        let doctor = Some(doctor.as_str()).filter(|d| !d.is_empty());

        let result = create_appointment_request(&name, &date, &time, level.as_str(), doctor)
            .and_then(|request| self.scheduler.enqueue_request(request));

        match result {
            Ok(id) => {
                println!("\nAppointment registered for {}", name);
                println!("Urgency: {}", level.name());
                println!("ID: {}...", &id[..8]);
                println!("Pending appointments in queue: {}", self.scheduler.pending_count());
            }
            Err(e) => println!("Error registering appointment: {}", e),
        }
    }

    fn serve_next(&mut self) {
        if let Some(current) = &self.now_serving {
            println!(
                "\nStill serving {}. Mark them complete first (option 3)",
                current.patient_name
            );
            return;
        }

        match self.scheduler.serve_next() {
            Some(apt) => {
                println!("\n--- Now Serving ---");
                Self::print_appointment(1, &apt);
                self.now_serving = Some(apt);
            }
            None => println!("\nNo pending appointments"),
        }
    }

    fn complete_appointment(&mut self) {
        println!("\n--- Mark Appointment Complete ---");

        if let Some(current) = self.now_serving.take() {
            match self.scheduler.complete(&current.appointment_id) {
                Ok(done) => println!("\nAppointment for {} completed", done.patient_name),
                Err(e) => println!("\nFailed to complete appointment: {}", e),
            }
            return;
        }

        let Some(apt) = self.select_pending("Select appointment to complete (0 to go back)") else {
            return;
        };
        match self.scheduler.complete(&apt.appointment_id) {
            Ok(done) => println!("\nAppointment for {} completed", done.patient_name),
            Err(e) => println!("\nFailed to complete appointment: {}", e),
        }
    }

    fn reschedule_appointment(&mut self) {
        println!("\n--- Reschedule Appointment ---");

        let serving = match &self.now_serving {
            Some(current) => {
                let prompt = format!(
                    "Reschedule {} who is being served? (y/n)",
                    current.patient_name
                );
                let Some(answer) = self.get_input(&prompt, Some("n")) else { return };
                answer.eq_ignore_ascii_case("y")
            }
            None => false,
        };

        let apt = if serving {
            self.now_serving.take()
        } else {
            self.select_pending("Select appointment to reschedule (0 to go back)")
        };
        let Some(apt) = apt else { return };
        let Some((date, time)) = self.get_date_time_input() else { return };
        let Some(level) = self.get_level_input("Urgency level", apt.level.as_str()) else {
            return;
        };

        match self
            .scheduler
            .reschedule(&apt.appointment_id, date, time, Some(level))
        {
            Ok(moved) => {
                println!(
                    "\nRescheduled {} to {} {} ({})",
                    moved.patient_name,
                    moved.date.format("%Y-%m-%d"),
                    moved.time.format("%H:%M"),
                    moved.level.name()
                );
            }
            Err(e) => println!("\nFailed to reschedule: {}", e),
        }
    }

    fn view_queue(&self) {
        if let Some(current) = &self.now_serving {
            println!("\nNow serving: {}", current.patient_name);
        }
        Self::print_queue("Pending Queue", &self.scheduler.list_pending());
    }

    fn search_queue(&mut self) {
        let Some(query) = self.get_input("Search (name, date, time or level)", None) else {
            return;
        };
        let found = self.scheduler.list_pending_where(search(&query));
        Self::print_queue(&format!("Matches for '{}'", query), &found);
    }

    fn doctor_queue(&mut self) {
        let Some(doctor) = self.get_input("Doctor name", None) else { return };
        if doctor.is_empty() {
            println!("Please enter a doctor name");
            return;
        }
        let found = self.scheduler.list_pending_where(for_doctor(&doctor));
        Self::print_queue(&format!("Queue for {}", doctor), &found);
    }

    fn view_statistics(&self) {
        let counts = self.scheduler.level_counts();
        println!("\n--- Queue Statistics ---");
        println!("  Critical:  {}", counts.critical);
        println!("  Emergency: {}", counts.emergency);
        println!("  Accident:  {}", counts.accident);
        println!("  Normal:    {}", counts.normal);
        println!("  Pending:   {}", counts.total());
        println!("  Completed: {}", self.scheduler.completed_count());
    }

    fn export_queue(&self) {
        match serde_json::to_string_pretty(&self.scheduler.list_pending()) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to export queue: {}", e),
        }
    }

    fn run_demo(&mut self) {
        println!("\n--- Running Demo ---");

        let mut scheduler = Scheduler::new(self.scheduler.config().clone());
        let today = Local::now().format("%Y-%m-%d").to_string();

        let patients = [
            ("Alice", "normal", "09:00"),
            ("Bob", "critical", "09:15"),
            ("Carol", "normal", "09:30"),
            ("Dan", "emergency", "10:00"),
            ("Eve", "emergency", "10:15"),
            ("Frank", "accident", "10:30"),
        ];

        println!("\nRegistering {} appointments...", patients.len());
        let mut frank_id = None;
        for (name, level, time) in patients {
            let result = create_appointment_request(name, &today, time, level, Some("Dr. Demo"))
                .and_then(|request| scheduler.enqueue_request(request));
            match result {
                Ok(id) => {
                    println!("  - {:6} {:9} at {}", name, level.to_uppercase(), time);
                    if name == "Frank" {
                        frank_id = Some(id);
                    }
                }
                Err(e) => println!("  - {}: {}", name, e),
            }
        }

        if let Some(id) = frank_id {
            if let Ok(date) = parse_date(&today) {
                let time = NaiveTime::from_hms_opt(11, 0, 0).unwrap_or_default();
                if let Ok(moved) =
                    scheduler.reschedule(&id, date, time, Some(UrgencyLevel::Critical))
                {
                    println!("\nFrank rescheduled to {} at 11:00", moved.level.name());
                }
            }
        }

        Self::print_queue("Serving Order", &scheduler.list_pending());

        println!("\nServing everyone:");
        while let Some(apt) = scheduler.serve_next() {
            match scheduler.complete(&apt.appointment_id) {
                Ok(done) => println!("  served and completed {}", done.patient_name),
                Err(e) => println!("  {}: {}", apt.patient_name, e),
            }
        }

        println!("\nNote: Bob and Frank (critical) were seen before everyone else,");
        println!("and Alice was seen before Carol because she arrived first.");
    }

    fn run(&mut self) {
        self.print_header();

        while self.running {
            self.print_menu();

            let Some(choice) = self.get_int_input("Enter choice", Some(10)) else { break };

            match choice {
                1 => self.register_appointment(),
                2 => self.serve_next(),
                3 => self.complete_appointment(),
                4 => self.reschedule_appointment(),
                5 => self.view_queue(),
                6 => self.search_queue(),
                7 => self.doctor_queue(),
                8 => self.view_statistics(),
                9 => self.export_queue(),
                10 => self.run_demo(),
                0 => {
                    self.running = false;
                    println!("\nGoodbye!");
                }
                _ => println!("Invalid choice"),
            }
        }
    }
}

fn main() {
    let config = SchedulerConfig::from_env();
    init_logging(&config.log_level);
    info!("Starting patient queue v{}", env!("CARGO_PKG_VERSION"));

    let mut cli = QueueCLI::new(config);
    cli.run();

    info!("Shutting down");
}
