fn main() {
    redmine_gamification_lib::run()
}
